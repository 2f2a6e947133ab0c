//! # REST API for the Dashboard

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;

use super::error::error_response;
use super::today;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub user_id: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_dashboard))
}

/// Counters and localized labels for the home screen
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    info!("GET /api/dashboard - user {:?}", query.user_id);

    let settings = match state.settings_service.load() {
        Ok(settings) => settings,
        Err(e) => return error_response("Failed to load settings", e),
    };
    let user_id = query.user_id.or(state.session_user_id);

    match state.dashboard_service.summary(user_id, today(), &settings).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response("Failed to build dashboard", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::test_support::{app, read_json, send, TestResult, NO_BODY};
    use axum::http::Method;
    use shared::{DashboardSummary, Language, TaskInput, UiSettings};

    #[tokio::test]
    async fn test_dashboard_counts_and_language() -> TestResult {
        let (app, state, _dir) = app().await?;
        state
            .task_service
            .create_task(TaskInput { title: "Call the bank".into(), ..Default::default() })
            .await?;
        state
            .settings_service
            .save(&UiSettings { language: Language::Bn, ..Default::default() })?;

        let response = send(&app, Method::GET, "/api/dashboard", NO_BODY).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let summary: DashboardSummary = read_json(response).await?;
        assert_eq!(summary.pending_tasks, 1);
        assert_eq!(summary.user_name, "Admin");
        assert!(summary.title.contains("লাইফ"));
        assert_eq!(summary.cards.len(), 5);

        let response = send(&app, Method::GET, "/api/dashboard?user_id=7", NO_BODY).await?;
        let summary: DashboardSummary = read_json(response).await?;
        assert_eq!(summary.user_name, "User 7");
        Ok(())
    }
}
