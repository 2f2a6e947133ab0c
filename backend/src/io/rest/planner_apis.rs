//! # REST API for the Task Planner
//!
//! Stateless planning: nothing is stored, the client decides what to keep.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use tracing::info;

use shared::{PlanRequest, PlanResponse};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/plan", post(plan_tasks))
}

/// Planning never fails; problems come back in `status_message`
pub async fn plan_tasks(State(state): State<AppState>, Json(request): Json<PlanRequest>) -> impl IntoResponse {
    info!("POST /api/planner/plan - {:?}", request);

    let outcome = state
        .planner_service
        .plan(&request.title, &request.description, request.source)
        .await;
    let response = PlanResponse {
        tasks: outcome.tasks,
        source: outcome.source,
        status_message: outcome.status,
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::planner::{ModelError, PlannerService, TaskGenerator};
    use crate::io::rest::test_support::{read_json, send, TestResult};
    use crate::{create_router, test_state};
    use async_trait::async_trait;
    use axum::http::Method;
    use shared::PlanSource;

    struct EchoModel;

    #[async_trait]
    impl TaskGenerator for EchoModel {
        async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
            Ok(format!("{} Stretch for ten minutes\n2. Jog around the park", prompt))
        }
    }

    fn request(title: &str, description: &str, source: PlanSource) -> PlanRequest {
        PlanRequest {
            title: title.to_string(),
            description: description.to_string(),
            source,
        }
    }

    #[tokio::test]
    async fn test_rule_based_plan() -> TestResult {
        let (state, _dir) = test_state(PlannerService::default()).await?;
        let app = create_router(state);
        let body = request("Learn MS Office", "in 1 month", PlanSource::Rules);
        let response = send(&app, Method::POST, "/api/planner/plan", Some(&body)).await?;
        assert_eq!(response.status(), StatusCode::OK);

        let plan: PlanResponse = read_json(response).await?;
        assert!(plan.tasks.len() <= 8);
        for (i, task) in plan.tasks.iter().take(4).enumerate() {
            assert!(task.starts_with(&format!("Week {}: ", i + 1)), "{}", task);
        }
        assert!(plan.tasks.iter().all(|t| t.split_whitespace().count() <= 10));
        Ok(())
    }

    #[tokio::test]
    async fn test_generative_plan_uses_model() -> TestResult {
        let generator: Arc<dyn TaskGenerator> = Arc::new(EchoModel);
        let (state, _dir) = test_state(PlannerService::new(Some(generator))).await?;
        let app = create_router(state);
        let body = request("Get fit", "", PlanSource::Generative);
        let plan: PlanResponse = read_json(send(&app, Method::POST, "/api/planner/plan", Some(&body)).await?).await?;
        assert_eq!(plan.source, PlanSource::Generative);
        assert_eq!(plan.tasks, vec!["Stretch for ten minutes", "Jog around the park"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_generative_without_model_reports_status() -> TestResult {
        let (state, _dir) = test_state(PlannerService::default()).await?;
        let app = create_router(state);
        let body = request("Get fit", "", PlanSource::Generative);
        let response = send(&app, Method::POST, "/api/planner/plan", Some(&body)).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let plan: PlanResponse = read_json(response).await?;
        assert!(plan.tasks.is_empty());
        assert_eq!(plan.status_message, "Task generation is not available");
        Ok(())
    }
}
