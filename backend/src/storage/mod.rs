//! # Storage Module
//!
//! Persistence for the life manager. Services only see the traits in
//! [`traits`]; the concrete backends are:
//!
//! - SQLite repositories over one shared sqlx pool ([`DbConnection`])
//! - [`JsonGoalStore`], a single-file alternative for goals
//!
//! UI settings are a separate YAML file handled by the settings service.

pub mod connection;
pub mod json_goal_store;
pub mod repositories;
pub mod traits;

pub use connection::DbConnection;
pub use json_goal_store::JsonGoalStore;
pub use repositories::{
    ExpenseRepository, GoalRepository, MedicationRepository, TaskRepository, UserRepository,
};
pub use traits::{
    ChecklistEdit, ChecklistToggle, CreateUserOutcome, ExpenseQuery, ExpenseStorage, GoalStorage,
    MedicationStorage, NewGoal, NewUser, ProgressUpdate, TaskStorage, ToggleOutcome, UserCredentials,
    UserStorage,
};
