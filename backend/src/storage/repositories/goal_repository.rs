use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqliteConnection};
use tracing::debug;

use shared::{Goal, GoalProgress, GoalStatus, GoalTask};

use super::enum_column;
use crate::domain::progress::{checklist_progress, is_complete};
use crate::storage::connection::DbConnection;
use crate::storage::traits::{
    ChecklistEdit, ChecklistToggle, GoalStorage, NewGoal, ProgressUpdate, ToggleOutcome,
};

const GOAL_COLUMNS: &str = "id, user_id, title, description, goal_type, target_value, current_value, \
     progress_percentage, deadline, status, priority, created_at, updated_at";

pub const CHECKLIST_NOTE: &str = "Checklist updated";

/// SQLite-backed goal storage: goals, their progress log and checklists
#[derive(Clone)]
pub struct GoalRepository {
    db: DbConnection,
}

impl GoalRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn goal_from_row(row: &SqliteRow) -> Result<Goal> {
        Ok(Goal {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            goal_type: enum_column(row, "goal_type")?,
            target_value: row.try_get("target_value")?,
            current_value: row.try_get("current_value")?,
            progress_percentage: row.try_get("progress_percentage")?,
            deadline: row.try_get("deadline")?,
            status: enum_column(row, "status")?,
            priority: enum_column(row, "priority")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn goal_task_from_row(row: &SqliteRow) -> Result<GoalTask> {
        Ok(GoalTask {
            id: row.try_get("id")?,
            goal_id: row.try_get("goal_id")?,
            task_description: row.try_get("task_description")?,
            is_completed: row.try_get("is_completed")?,
        })
    }

    async fn fetch_goal<'e, E>(executor: E, goal_id: i64, user_id: i64) -> Result<Option<Goal>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query(&format!(
            "SELECT {} FROM goals WHERE id = ? AND user_id = ?",
            GOAL_COLUMNS
        ))
        .bind(goal_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
        row.as_ref().map(Self::goal_from_row).transpose()
    }

    async fn log_progress<'e, E>(
        executor: E,
        goal_id: i64,
        user_id: i64,
        progress: i64,
        notes: Option<&str>,
        timestamp: &str,
    ) -> Result<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO goal_progress (goal_id, user_id, progress_percentage, notes, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(goal_id)
        .bind(user_id)
        .bind(progress)
        .bind(notes)
        .bind(timestamp)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Set the goal's progress from its checklist ratio and log the change
    async fn recompute_from_checklist(
        conn: &mut SqliteConnection,
        goal_id: i64,
        user_id: i64,
        timestamp: &str,
    ) -> Result<i64> {
        let (completed, total): (Option<i64>, i64) =
            sqlx::query_as("SELECT SUM(is_completed), COUNT(*) FROM goal_tasks WHERE goal_id = ?")
                .bind(goal_id)
                .fetch_one(&mut *conn)
                .await?;
        let progress = checklist_progress(completed.unwrap_or(0) as usize, total as usize);

        sqlx::query(
            r#"
            UPDATE goals
            SET progress_percentage = ?, updated_at = ?,
                status = CASE WHEN ? THEN 'Completed' ELSE status END
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(progress)
        .bind(timestamp)
        .bind(is_complete(progress))
        .bind(goal_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        Self::log_progress(&mut *conn, goal_id, user_id, progress, Some(CHECKLIST_NOTE), timestamp).await?;
        debug!("Checklist moved goal {} to {}%", goal_id, progress);
        Ok(progress)
    }
}

#[async_trait]
impl GoalStorage for GoalRepository {
    async fn create_goal(&self, goal: &NewGoal) -> Result<Goal> {
        let done = sqlx::query(
            r#"
            INSERT INTO goals (user_id, title, description, goal_type, target_value, current_value,
                               progress_percentage, deadline, status, priority, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(goal.user_id)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.goal_type.as_str())
        .bind(goal.target_value)
        .bind(&goal.deadline)
        .bind(GoalStatus::Active.as_str())
        .bind(goal.priority.as_str())
        .bind(&goal.created_at)
        .bind(&goal.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(Goal {
            id: done.last_insert_rowid(),
            user_id: goal.user_id,
            title: goal.title.clone(),
            description: goal.description.clone(),
            goal_type: goal.goal_type,
            target_value: goal.target_value,
            current_value: 0.0,
            progress_percentage: 0,
            deadline: goal.deadline.clone(),
            status: GoalStatus::Active,
            priority: goal.priority,
            created_at: goal.created_at.clone(),
            updated_at: goal.created_at.clone(),
        })
    }

    async fn get_goal(&self, goal_id: i64, user_id: i64) -> Result<Option<Goal>> {
        Self::fetch_goal(self.db.pool(), goal_id, user_id).await
    }

    async fn list_goals(&self, user_id: i64, status: Option<GoalStatus>) -> Result<Vec<Goal>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {} FROM goals WHERE user_id = ? AND status = ? ORDER BY created_at DESC, id DESC",
                    GOAL_COLUMNS
                ))
                .bind(user_id)
                .bind(status.as_str())
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM goals WHERE user_id = ? ORDER BY created_at DESC, id DESC",
                    GOAL_COLUMNS
                ))
                .bind(user_id)
                .fetch_all(self.db.pool())
                .await?
            }
        };
        rows.iter().map(Self::goal_from_row).collect()
    }

    async fn save_goal(&self, goal: &Goal) -> Result<bool> {
        let done = sqlx::query(
            r#"
            UPDATE goals
            SET title = ?, description = ?, goal_type = ?, target_value = ?, current_value = ?,
                progress_percentage = ?, deadline = ?, status = ?, priority = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.goal_type.as_str())
        .bind(goal.target_value)
        .bind(goal.current_value)
        .bind(goal.progress_percentage)
        .bind(&goal.deadline)
        .bind(goal.status.as_str())
        .bind(goal.priority.as_str())
        .bind(&goal.updated_at)
        .bind(goal.id)
        .bind(goal.user_id)
        .execute(self.db.pool())
        .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn apply_progress(&self, update: &ProgressUpdate) -> Result<Option<Goal>> {
        let mut tx = self.db.pool().begin().await?;

        let done = sqlx::query(
            r#"
            UPDATE goals
            SET current_value = ?, progress_percentage = ?, updated_at = ?,
                status = CASE WHEN ? THEN 'Completed' ELSE status END
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(update.current_value)
        .bind(update.progress_percentage)
        .bind(&update.timestamp)
        .bind(update.complete)
        .bind(update.goal_id)
        .bind(update.user_id)
        .execute(&mut *tx)
        .await?;

        if done.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Ok(None);
        }

        Self::log_progress(
            &mut *tx,
            update.goal_id,
            update.user_id,
            update.progress_percentage,
            update.notes.as_deref(),
            &update.timestamp,
        )
        .await?;

        let goal = Self::fetch_goal(&mut *tx, update.goal_id, update.user_id).await?;
        tx.commit().await?;
        debug!("Applied progress {}% to goal {}", update.progress_percentage, update.goal_id);
        Ok(goal)
    }

    async fn delete_goal(&self, goal_id: i64, user_id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        if Self::fetch_goal(&mut *tx, goal_id, user_id).await?.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM goal_progress WHERE goal_id = ?")
            .bind(goal_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM goal_tasks WHERE goal_id = ?")
            .bind(goal_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM goals WHERE id = ? AND user_id = ?")
            .bind(goal_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn progress_history(&self, goal_id: i64, user_id: i64) -> Result<Vec<GoalProgress>> {
        let rows = sqlx::query(
            r#"
            SELECT id, goal_id, user_id, progress_percentage, notes, created_at
            FROM goal_progress
            WHERE goal_id = ? AND user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(goal_id)
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(GoalProgress {
                    id: row.try_get("id")?,
                    goal_id: row.try_get("goal_id")?,
                    user_id: row.try_get("user_id")?,
                    progress_percentage: row.try_get("progress_percentage")?,
                    notes: row.try_get("notes")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn count_open_goals(&self, user_id: Option<i64>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM goals
            WHERE status NOT IN ('Completed', 'Achieved')
              AND (? IS NULL OR user_id = ?)
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count)
    }

    async fn list_goal_tasks(&self, goal_id: i64) -> Result<Vec<GoalTask>> {
        let rows = sqlx::query(
            "SELECT id, goal_id, task_description, is_completed FROM goal_tasks WHERE goal_id = ? ORDER BY id",
        )
        .bind(goal_id)
        .fetch_all(self.db.pool())
        .await?;
        rows.iter().map(Self::goal_task_from_row).collect()
    }

    async fn add_goal_tasks(
        &self,
        edit: &ChecklistEdit,
        descriptions: &[String],
        replace: bool,
    ) -> Result<Option<Vec<GoalTask>>> {
        let mut tx = self.db.pool().begin().await?;

        if Self::fetch_goal(&mut *tx, edit.goal_id, edit.user_id).await?.is_none() {
            return Ok(None);
        }
        if replace {
            sqlx::query("DELETE FROM goal_tasks WHERE goal_id = ?")
                .bind(edit.goal_id)
                .execute(&mut *tx)
                .await?;
        }
        for description in descriptions {
            sqlx::query("INSERT INTO goal_tasks (goal_id, task_description, is_completed) VALUES (?, ?, 0)")
                .bind(edit.goal_id)
                .bind(description)
                .execute(&mut *tx)
                .await?;
        }
        if edit.recompute_progress {
            Self::recompute_from_checklist(&mut *tx, edit.goal_id, edit.user_id, &edit.timestamp).await?;
        }

        tx.commit().await?;
        self.list_goal_tasks(edit.goal_id).await.map(Some)
    }

    async fn toggle_goal_task(&self, toggle: &ChecklistToggle) -> Result<Option<ToggleOutcome>> {
        let mut tx = self.db.pool().begin().await?;

        if Self::fetch_goal(&mut *tx, toggle.goal_id, toggle.user_id).await?.is_none() {
            return Ok(None);
        }

        let done = sqlx::query(
            "UPDATE goal_tasks SET is_completed = NOT is_completed WHERE id = ? AND goal_id = ?",
        )
        .bind(toggle.task_id)
        .bind(toggle.goal_id)
        .execute(&mut *tx)
        .await?;
        if done.rows_affected() == 0 {
            return Ok(None);
        }

        let task_row = sqlx::query(
            "SELECT id, goal_id, task_description, is_completed FROM goal_tasks WHERE id = ?",
        )
        .bind(toggle.task_id)
        .fetch_one(&mut *tx)
        .await?;
        let task = Self::goal_task_from_row(&task_row)?;

        if toggle.recompute_progress {
            Self::recompute_from_checklist(&mut *tx, toggle.goal_id, toggle.user_id, &toggle.timestamp).await?;
        }

        let goal = Self::fetch_goal(&mut *tx, toggle.goal_id, toggle.user_id).await?;
        tx.commit().await?;
        Ok(goal.map(|goal| ToggleOutcome { task, goal }))
    }

    async fn delete_goal_task(&self, edit: &ChecklistEdit, task_id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        if Self::fetch_goal(&mut *tx, edit.goal_id, edit.user_id).await?.is_none() {
            return Ok(false);
        }
        let done = sqlx::query("DELETE FROM goal_tasks WHERE id = ? AND goal_id = ?")
            .bind(task_id)
            .bind(edit.goal_id)
            .execute(&mut *tx)
            .await?;
        if done.rows_affected() == 0 {
            return Ok(false);
        }
        if edit.recompute_progress {
            Self::recompute_from_checklist(&mut *tx, edit.goal_id, edit.user_id, &edit.timestamp).await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
