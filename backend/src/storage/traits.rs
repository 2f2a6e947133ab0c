//! # Storage Traits
//!
//! The seams between the services and the persistence backends. Services hold
//! `Arc<dyn ...Storage>` so the SQLite repositories and the JSON goal store
//! can be swapped without touching domain code.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    DatePeriod, Expense, ExpenseInput, ExpenseStatus, Goal, GoalProgress, GoalStatus, GoalTask,
    GoalType, Medication, MedicationInput, Priority, Task, TaskInput, TaskListRequest, TaskStatus,
    User,
};

/// Fields of a user about to be registered
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
}

/// Outcome of inserting a user; a unique-constraint hit is not an error
#[derive(Debug, Clone, PartialEq)]
pub enum CreateUserOutcome {
    Created(User),
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<CreateUserOutcome>;

    /// Look a user up by name or email
    async fn find_credentials(&self, identifier: &str) -> Result<Option<UserCredentials>>;

    async fn get_user(&self, user_id: i64) -> Result<Option<User>>;
}

/// Filters for listing expenses. `today` anchors the date period.
#[derive(Debug, Clone)]
pub struct ExpenseQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<ExpenseStatus>,
    pub period: DatePeriod,
    pub today: NaiveDate,
}

impl ExpenseQuery {
    pub fn all(today: NaiveDate) -> Self {
        Self {
            search: None,
            category: None,
            status: None,
            period: DatePeriod::AllTime,
            today,
        }
    }
}

#[async_trait]
pub trait ExpenseStorage: Send + Sync {
    async fn insert_expense(&self, input: &ExpenseInput) -> Result<Expense>;

    /// Returns `None` when no expense has this id
    async fn update_expense(&self, id: i64, input: &ExpenseInput) -> Result<Option<Expense>>;

    async fn delete_expense(&self, id: i64) -> Result<bool>;

    async fn get_expense(&self, id: i64) -> Result<Option<Expense>>;

    /// Ordered by expense date, then creation time, newest first
    async fn list_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>>;

    async fn recent_expenses(&self, limit: u32) -> Result<Vec<Expense>>;

    /// Sum of amounts dated on or after `since`
    async fn sum_since(&self, since: NaiveDate) -> Result<f64>;

    async fn delete_all_expenses(&self) -> Result<u64>;
}

#[async_trait]
pub trait TaskStorage: Send + Sync {
    async fn insert_task(&self, input: &TaskInput) -> Result<Task>;

    async fn update_task(&self, id: i64, input: &TaskInput) -> Result<Option<Task>>;

    async fn delete_task(&self, id: i64) -> Result<bool>;

    async fn get_task(&self, id: i64) -> Result<Option<Task>>;

    async fn list_tasks(&self, request: &TaskListRequest) -> Result<Vec<Task>>;

    async fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<Option<Task>>;

    async fn count_tasks_with_status(&self, status: TaskStatus) -> Result<i64>;
}

#[async_trait]
pub trait MedicationStorage: Send + Sync {
    async fn insert_medication(&self, input: &MedicationInput) -> Result<Medication>;

    async fn update_medication(&self, id: i64, input: &MedicationInput) -> Result<Option<Medication>>;

    async fn delete_medication(&self, id: i64) -> Result<bool>;

    async fn get_medication(&self, id: i64) -> Result<Option<Medication>>;

    /// Ordered by start date, newest first. `search` matches part of the name.
    async fn list_medications(&self, search: Option<&str>) -> Result<Vec<Medication>>;

    /// Medications started on or before `today` that have not ended before it
    async fn count_active_medications(&self, today: NaiveDate) -> Result<i64>;
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub goal_type: GoalType,
    pub target_value: Option<f64>,
    pub deadline: Option<String>,
    pub priority: Priority,
    pub created_at: String,
}

/// A progress change and the log entry recording it. Applied atomically.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub goal_id: i64,
    pub user_id: i64,
    pub current_value: f64,
    pub progress_percentage: i64,
    /// Set the goal's status to Completed as part of the update
    pub complete: bool,
    pub notes: Option<String>,
    pub timestamp: String,
}

/// A change to a goal's checklist. With `recompute_progress` the goal's
/// progress is reset from the checklist ratio in the same transaction, and
/// the goal completes when every item is done.
#[derive(Debug, Clone)]
pub struct ChecklistEdit {
    pub goal_id: i64,
    pub user_id: i64,
    pub recompute_progress: bool,
    pub timestamp: String,
}

/// Flip a checklist item; progress follows the same rule as [`ChecklistEdit`]
#[derive(Debug, Clone)]
pub struct ChecklistToggle {
    pub goal_id: i64,
    pub user_id: i64,
    pub task_id: i64,
    pub recompute_progress: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    pub task: GoalTask,
    pub goal: Goal,
}

#[async_trait]
pub trait GoalStorage: Send + Sync {
    async fn create_goal(&self, goal: &NewGoal) -> Result<Goal>;

    async fn get_goal(&self, goal_id: i64, user_id: i64) -> Result<Option<Goal>>;

    /// Newest first
    async fn list_goals(&self, user_id: i64, status: Option<GoalStatus>) -> Result<Vec<Goal>>;

    /// Overwrite the editable fields of an existing goal
    async fn save_goal(&self, goal: &Goal) -> Result<bool>;

    /// Returns `None`, and writes nothing, when the goal does not exist
    async fn apply_progress(&self, update: &ProgressUpdate) -> Result<Option<Goal>>;

    /// Removes the goal with its progress log and checklist
    async fn delete_goal(&self, goal_id: i64, user_id: i64) -> Result<bool>;

    async fn progress_history(&self, goal_id: i64, user_id: i64) -> Result<Vec<GoalProgress>>;

    /// Goals not yet Completed or Achieved; all users when `user_id` is None
    async fn count_open_goals(&self, user_id: Option<i64>) -> Result<i64>;

    async fn list_goal_tasks(&self, goal_id: i64) -> Result<Vec<GoalTask>>;

    /// Returns `None`, and writes nothing, when the goal does not exist
    async fn add_goal_tasks(
        &self,
        edit: &ChecklistEdit,
        descriptions: &[String],
        replace: bool,
    ) -> Result<Option<Vec<GoalTask>>>;

    async fn toggle_goal_task(&self, toggle: &ChecklistToggle) -> Result<Option<ToggleOutcome>>;

    async fn delete_goal_task(&self, edit: &ChecklistEdit, task_id: i64) -> Result<bool>;
}
