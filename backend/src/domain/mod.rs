//! # Domain Module
//!
//! Business rules of the life manager. Every service owns its validation and
//! talks to storage only through the traits in [`crate::storage`], so the
//! same rules run against SQLite, the JSON goal store or a test double.
//!
//! ## Key Components
//!
//! - **Progress**: target ratio and checklist ratio for goals
//! - **Planner**: rule-based task plans with an optional generative fallback
//! - **Services**: one per entity (users, expenses, tasks, goals, medications)
//! - **Dashboard**: counters and localized labels for the home screen
//! - **Settings**: theme and language, persisted as YAML

pub mod auth_service;
pub mod dashboard_service;
pub mod date_filter;
pub mod errors;
pub mod expense_service;
pub mod export_service;
pub mod goal_service;
pub mod localization;
pub mod medication_service;
pub mod planner;
pub mod progress;
pub mod settings_service;
pub mod task_service;
pub mod validation;

pub use auth_service::AuthService;
pub use dashboard_service::DashboardService;
pub use errors::{DomainError, DomainResult};
pub use expense_service::ExpenseService;
pub use export_service::ExportService;
pub use goal_service::GoalService;
pub use localization::Localizer;
pub use medication_service::MedicationService;
pub use planner::{LocalModelGenerator, PlannerService, TaskGenerator};
pub use settings_service::SettingsService;
pub use task_service::TaskService;
