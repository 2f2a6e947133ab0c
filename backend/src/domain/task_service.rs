use std::sync::Arc;

use tracing::info;

use shared::{Task, TaskInput, TaskListRequest, TaskStatus};

use super::errors::{DomainError, DomainResult};
use super::validation::{optional_date, required};
use crate::storage::TaskStorage;

fn validate_task(input: TaskInput) -> DomainResult<TaskInput> {
    Ok(TaskInput {
        title: required(&input.title, "Title")?,
        description: input.description.trim().to_string(),
        priority: input.priority,
        status: input.status,
        due_date: optional_date(input.due_date.as_deref(), "Due date")?,
    })
}

fn task_not_found(id: i64) -> DomainError {
    DomainError::not_found(format!("Task {} not found", id))
}

/// To-do list management
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStorage>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStorage>) -> Self {
        Self { tasks }
    }

    pub async fn create_task(&self, input: TaskInput) -> DomainResult<Task> {
        let input = validate_task(input)?;
        let task = self.tasks.insert_task(&input).await?;
        info!("Created task {}: {}", task.id, task.title);
        Ok(task)
    }

    pub async fn update_task(&self, id: i64, input: TaskInput) -> DomainResult<Task> {
        let input = validate_task(input)?;
        let task = self.tasks.update_task(id, &input).await?.ok_or_else(|| task_not_found(id))?;
        info!("Updated task {}", id);
        Ok(task)
    }

    pub async fn delete_task(&self, id: i64) -> DomainResult<()> {
        if !self.tasks.delete_task(id).await? {
            return Err(task_not_found(id));
        }
        info!("Deleted task {}", id);
        Ok(())
    }

    pub async fn get_task(&self, id: i64) -> DomainResult<Task> {
        self.tasks.get_task(id).await?.ok_or_else(|| task_not_found(id))
    }

    pub async fn list_tasks(&self, request: TaskListRequest) -> DomainResult<Vec<Task>> {
        Ok(self.tasks.list_tasks(&request).await?)
    }

    /// Quick status change, e.g. marking a task done from the list
    pub async fn set_status(&self, id: i64, status: TaskStatus) -> DomainResult<Task> {
        let task = self
            .tasks
            .set_task_status(id, status)
            .await?
            .ok_or_else(|| task_not_found(id))?;
        info!("Task {} is now {}", id, status);
        Ok(task)
    }

    pub async fn count_pending(&self) -> DomainResult<i64> {
        Ok(self.tasks.count_tasks_with_status(TaskStatus::Pending).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DbConnection, TaskRepository};
    use shared::Priority;

    async fn service() -> TaskService {
        let db = DbConnection::init_test().await.unwrap();
        TaskService::new(Arc::new(TaskRepository::new(db)))
    }

    fn input(title: &str, due: Option<&str>) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: " notes ".to_string(),
            priority: Priority::High,
            status: TaskStatus::Pending,
            due_date: due.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_validation() {
        let service = service().await;
        let err = service.create_task(input("  ", None)).await.unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
        let err = service.create_task(input("Pay", Some("tomorrow"))).await.unwrap_err();
        assert_eq!(err.to_string(), "Due date must be in YYYY-MM-DD format");

        let task = service.create_task(input(" Pay ", Some(""))).await.unwrap();
        assert_eq!(task.title, "Pay");
        assert_eq!(task.description, "notes");
        assert_eq!(task.due_date, None);
    }

    #[tokio::test]
    async fn test_complete_and_pending_count() {
        let service = service().await;
        let a = service.create_task(input("A", Some("2025-09-01"))).await.unwrap();
        service.create_task(input("B", None)).await.unwrap();
        assert_eq!(service.count_pending().await.unwrap(), 2);

        let done = service.set_status(a.id, TaskStatus::Completed).await.unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(service.count_pending().await.unwrap(), 1);

        let completed = service
            .list_tasks(TaskListRequest { status: Some(TaskStatus::Completed), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);

        assert!(matches!(service.set_status(99, TaskStatus::Completed).await, Err(DomainError::NotFound(_))));
        service.delete_task(a.id).await.unwrap();
        assert!(matches!(service.get_task(a.id).await, Err(DomainError::NotFound(_))));
    }
}
