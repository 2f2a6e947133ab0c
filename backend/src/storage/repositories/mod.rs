pub mod expense_repository;
pub mod goal_repository;
pub mod medication_repository;
pub mod task_repository;
pub mod user_repository;

pub use expense_repository::ExpenseRepository;
pub use goal_repository::GoalRepository;
pub use medication_repository::MedicationRepository;
pub use task_repository::TaskRepository;
pub use user_repository::UserRepository;

use std::str::FromStr;

use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Read a TEXT column holding one of the shared string enums
pub(crate) fn enum_column<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(|e| anyhow!("Column {}: {}", column, e))
}
