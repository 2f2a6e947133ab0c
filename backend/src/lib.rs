//! # Life Manager Backend
//!
//! Everything that is not UI: expenses, tasks, goals, medications, accounts,
//! the dashboard and the UI settings, served as a JSON REST API.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST routers under /api)
//!     ↓
//! Domain Layer (services, validation, progress, planner)
//!     ↓
//! Storage Layer (sqlx SQLite repositories, JSON goal store)
//! ```
//!
//! [`initialize_backend`] wires the layers together from an [`AppConfig`];
//! [`create_router`] turns the result into an axum router.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::{AppConfig, GoalStoreKind};

use domain::{
    AuthService, DashboardService, ExpenseService, ExportService, GoalService, LocalModelGenerator,
    MedicationService, PlannerService, SettingsService, TaskGenerator, TaskService,
};
use storage::{
    DbConnection, ExpenseRepository, GoalRepository, GoalStorage, JsonGoalStore, MedicationRepository,
    TaskRepository, UserRepository,
};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub expense_service: ExpenseService,
    pub export_service: ExportService,
    pub task_service: TaskService,
    pub goal_service: GoalService,
    pub medication_service: MedicationService,
    pub dashboard_service: DashboardService,
    pub planner_service: PlannerService,
    pub settings_service: SettingsService,
    /// User the process was started for; goal routes fall back to it
    pub session_user_id: Option<i64>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Goal owner for a request: explicit, then session user, then 1
    pub fn goal_user(&self, requested: Option<i64>) -> i64 {
        requested.or(self.session_user_id).unwrap_or(1)
    }
}

fn build_state(
    db: DbConnection,
    goals: Arc<dyn GoalStorage>,
    planner_service: PlannerService,
    settings_service: SettingsService,
    session_user_id: Option<i64>,
    config: AppConfig,
) -> AppState {
    let expenses = Arc::new(ExpenseRepository::new(db.clone()));

    let auth_service =
        AuthService::new(Arc::new(UserRepository::new(db.clone()))).with_iterations(config.password_iterations);
    let expense_service = ExpenseService::new(expenses.clone());
    let export_service = ExportService::new(expenses);
    let task_service = TaskService::new(Arc::new(TaskRepository::new(db.clone())));
    let medication_service = MedicationService::new(Arc::new(MedicationRepository::new(db)));
    let goal_service = GoalService::new(goals, planner_service.clone());
    let dashboard_service = DashboardService::new(
        auth_service.clone(),
        task_service.clone(),
        medication_service.clone(),
        goal_service.clone(),
        expense_service.clone(),
    );

    AppState {
        auth_service,
        expense_service,
        export_service,
        task_service,
        goal_service,
        medication_service,
        dashboard_service,
        planner_service,
        settings_service,
        session_user_id,
        config: Arc::new(config),
    }
}

fn build_planner(config: &AppConfig) -> PlannerService {
    let model_path = config.model.model_path();
    if !model_path.exists() {
        warn!(
            "Model directory {:?} not found; generative planning will report it as unavailable",
            model_path
        );
    }
    match LocalModelGenerator::new(&config.model) {
        Ok(generator) => {
            let generator: Arc<dyn TaskGenerator> = Arc::new(generator);
            PlannerService::new(Some(generator))
        }
        Err(e) => {
            warn!("Generative planning disabled: {}", e);
            PlannerService::new(None)
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: AppConfig, session_user_id: Option<i64>) -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::init(&config).await?;

    let goals: Arc<dyn GoalStorage> = match config.goal_store {
        GoalStoreKind::Sqlite => Arc::new(GoalRepository::new(db.clone())),
        GoalStoreKind::Json => {
            let store = JsonGoalStore::new(config.goal_store_path());
            info!("Keeping goals in {:?}", store.path());
            Arc::new(store)
        }
    };

    info!("Setting up domain model");
    let planner = build_planner(&config);
    let settings = SettingsService::new(config.settings_path());

    Ok(build_state(db, goals, planner, settings, session_user_id, config))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/auth", io::rest::auth_apis::router())
        .nest("/dashboard", io::rest::dashboard_apis::router())
        .nest("/expenses", io::rest::expense_apis::router())
        .nest("/tasks", io::rest::task_apis::router())
        .nest("/goals", io::rest::goal_apis::router())
        .nest("/planner", io::rest::planner_apis::router())
        .nest("/medications", io::rest::medication_apis::router())
        .nest("/settings", io::rest::settings_apis::router());

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// In-memory state for handler tests. The settings file lives in the
/// returned temp dir, which is removed when the caller drops it.
#[cfg(test)]
pub(crate) async fn test_state(planner: PlannerService) -> Result<(AppState, tempfile::TempDir)> {
    let db = DbConnection::init_test().await?;
    let dir = tempfile::tempdir()?;
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        password_iterations: 1_000,
        ..AppConfig::default()
    };
    let goals: Arc<dyn GoalStorage> = Arc::new(GoalRepository::new(db.clone()));
    let settings = SettingsService::new(config.settings_path());
    Ok((build_state(db, goals, planner, settings, None, config), dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_data_dir_is_removed_on_drop() {
        let (state, dir) = test_state(PlannerService::default()).await.unwrap();
        let data_dir = state.config.data_dir.clone();
        assert_eq!(data_dir, dir.path());

        state.settings_service.save(&Default::default()).unwrap();
        assert!(state.config.settings_path().exists());

        drop(dir);
        assert!(!data_dir.exists());
    }
}
