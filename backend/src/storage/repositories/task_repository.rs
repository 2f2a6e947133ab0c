use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use shared::{Task, TaskInput, TaskListRequest, TaskStatus};

use super::enum_column;
use crate::storage::connection::DbConnection;
use crate::storage::traits::TaskStorage;

const TASK_COLUMNS: &str = "id, title, description, priority, status, due_date, created_at";

/// Repository for the to-do list
#[derive(Clone)]
pub struct TaskRepository {
    db: DbConnection,
}

impl TaskRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn task_from_row(row: &SqliteRow) -> Result<Task> {
        Ok(Task {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            priority: enum_column(row, "priority")?,
            status: enum_column(row, "status")?,
            due_date: row.try_get("due_date")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl TaskStorage for TaskRepository {
    async fn insert_task(&self, input: &TaskInput) -> Result<Task> {
        let created_at = Utc::now().to_rfc3339();
        let done = sqlx::query(
            r#"
            INSERT INTO tasks (title, description, priority, status, due_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.priority.as_str())
        .bind(input.status.as_str())
        .bind(&input.due_date)
        .bind(&created_at)
        .execute(self.db.pool())
        .await?;

        Ok(Task {
            id: done.last_insert_rowid(),
            title: input.title.clone(),
            description: input.description.clone(),
            priority: input.priority,
            status: input.status,
            due_date: input.due_date.clone(),
            created_at,
        })
    }

    async fn update_task(&self, id: i64, input: &TaskInput) -> Result<Option<Task>> {
        let done = sqlx::query(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, priority = ?, status = ?, due_date = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.priority.as_str())
        .bind(input.status.as_str())
        .bind(&input.due_date)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if done.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_task(id).await
    }

    async fn delete_task(&self, id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let row = sqlx::query(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(Self::task_from_row).transpose()
    }

    async fn list_tasks(&self, request: &TaskListRequest) -> Result<Vec<Task>> {
        let mut conditions = Vec::new();
        let mut args = Vec::new();
        if let Some(status) = request.status {
            conditions.push("status = ?");
            args.push(status.as_str().to_string());
        }
        if let Some(priority) = request.priority {
            conditions.push("priority = ?");
            args.push(priority.as_str().to_string());
        }
        if let Some(search) = request.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            conditions.push("(title LIKE ? OR description LIKE ?)");
            let pattern = format!("%{}%", search);
            args.push(pattern.clone());
            args.push(pattern);
        }

        let mut sql = format!("SELECT {} FROM tasks", TASK_COLUMNS);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        // Undated tasks sort after dated ones
        sql.push_str(" ORDER BY due_date IS NULL, due_date ASC, id DESC");

        let mut q = sqlx::query(&sql);
        for arg in &args {
            q = q.bind(arg);
        }
        let rows = q.fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::task_from_row).collect()
    }

    async fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<Option<Task>> {
        let done = sqlx::query("UPDATE tasks SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if done.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_task(id).await
    }

    async fn count_tasks_with_status(&self, status: TaskStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Priority;

    fn input(title: &str, priority: Priority, due: Option<&str>) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: String::new(),
            priority,
            status: TaskStatus::Pending,
            due_date: due.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_list_filters_and_order() {
        let repo = TaskRepository::new(DbConnection::init_test().await.unwrap());
        repo.insert_task(&input("Pay bills", Priority::High, Some("2025-09-01"))).await.unwrap();
        repo.insert_task(&input("Call mom", Priority::Low, None)).await.unwrap();
        let gym = repo.insert_task(&input("Gym", Priority::High, Some("2025-08-30"))).await.unwrap();

        let all = repo.list_tasks(&TaskListRequest::default()).await.unwrap();
        let titles: Vec<&str> = all.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Gym", "Pay bills", "Call mom"]);

        let high = repo
            .list_tasks(&TaskListRequest {
                priority: Some(Priority::High),
                search: Some("bill".to_string()),
                ..TaskListRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].title, "Pay bills");

        let done = repo.set_task_status(gym.id, TaskStatus::Completed).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(repo.count_tasks_with_status(TaskStatus::Pending).await.unwrap(), 2);
        assert!(repo.set_task_status(404, TaskStatus::Completed).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = TaskRepository::new(DbConnection::init_test().await.unwrap());
        let task = repo.insert_task(&input("Draft", Priority::Medium, None)).await.unwrap();
        let mut edit = input("Final", Priority::Low, Some("2025-10-10"));
        edit.status = TaskStatus::InProgress;
        let updated = repo.update_task(task.id, &edit).await.unwrap().unwrap();
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert!(repo.delete_task(task.id).await.unwrap());
        assert!(repo.get_task(task.id).await.unwrap().is_none());
    }
}
