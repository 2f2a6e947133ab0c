//! # REST API for Goal Management
//!
//! Endpoints for goals, their progress log and their checklists. Every
//! route accepts `?user_id=`; without it the session user (or user 1) owns
//! the request.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::info;

use shared::{
    CreateGoalRequest, DeleteResponse, GenerateGoalTasksRequest, GoalStatus, GoalTaskInput,
    ToggleGoalTaskResponse, UpdateGoalRequest, UpdateProgressRequest,
};

use super::error::error_response;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GoalQuery {
    pub user_id: Option<i64>,
    pub status: Option<GoalStatus>,
}

/// Create a router for goal related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_goals).post(create_goal))
        .route("/stats", get(get_goal_stats))
        .route("/:id", get(get_goal).put(update_goal).delete(delete_goal))
        .route("/:id/progress", get(get_progress_history).post(update_progress))
        .route("/:id/complete", post(complete_goal))
        .route("/:id/tasks", get(list_goal_tasks).post(add_goal_task))
        .route("/:id/tasks/generate", post(generate_goal_tasks))
        .route("/:id/tasks/:task_id", axum::routing::delete(delete_goal_task))
        .route("/:id/tasks/:task_id/toggle", put(toggle_goal_task))
}

pub async fn list_goals(State(state): State<AppState>, Query(query): Query<GoalQuery>) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("GET /api/goals - user {} status {:?}", user_id, query.status);

    match state.goal_service.list_goals(user_id, query.status).await {
        Ok(goals) => (StatusCode::OK, Json(goals)).into_response(),
        Err(e) => error_response("Failed to list goals", e),
    }
}

pub async fn create_goal(
    State(state): State<AppState>,
    Query(query): Query<GoalQuery>,
    Json(request): Json<CreateGoalRequest>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("POST /api/goals - user {} request: {:?}", user_id, request);

    match state.goal_service.create_goal(user_id, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to create goal", e),
    }
}

pub async fn get_goal_stats(State(state): State<AppState>, Query(query): Query<GoalQuery>) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("GET /api/goals/stats - user {}", user_id);

    match state.goal_service.goal_stats(user_id).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response("Failed to compute goal stats", e),
    }
}

pub async fn get_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GoalQuery>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("GET /api/goals/{} - user {}", id, user_id);

    match state.goal_service.get_goal(id, user_id).await {
        Ok(goal) => (StatusCode::OK, Json(goal)).into_response(),
        Err(e) => error_response("Failed to get goal", e),
    }
}

pub async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GoalQuery>,
    Json(request): Json<UpdateGoalRequest>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("PUT /api/goals/{} - request: {:?}", id, request);

    match state.goal_service.update_goal(id, user_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to update goal", e),
    }
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GoalQuery>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("DELETE /api/goals/{} - user {}", id, user_id);

    match state.goal_service.delete_goal(id, user_id).await {
        Ok(()) => {
            let response = DeleteResponse {
                success_message: "Goal deleted successfully".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("Failed to delete goal", e),
    }
}

pub async fn update_progress(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GoalQuery>,
    Json(request): Json<UpdateProgressRequest>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("POST /api/goals/{}/progress - {:?}", id, request);

    match state
        .goal_service
        .update_progress(id, user_id, request.current_value, request.notes)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to update goal progress", e),
    }
}

pub async fn get_progress_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GoalQuery>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("GET /api/goals/{}/progress", id);

    match state.goal_service.progress_history(id, user_id).await {
        Ok(history) => (StatusCode::OK, Json(history)).into_response(),
        Err(e) => error_response("Failed to get goal progress", e),
    }
}

pub async fn complete_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GoalQuery>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("POST /api/goals/{}/complete", id);

    match state.goal_service.complete_goal(id, user_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to complete goal", e),
    }
}

pub async fn list_goal_tasks(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GoalQuery>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("GET /api/goals/{}/tasks", id);

    match state.goal_service.list_goal_tasks(id, user_id).await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => error_response("Failed to list goal tasks", e),
    }
}

pub async fn add_goal_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GoalQuery>,
    Json(input): Json<GoalTaskInput>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("POST /api/goals/{}/tasks - {:?}", id, input);

    match state.goal_service.add_goal_task(id, user_id, &input.task_description).await {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => error_response("Failed to add goal task", e),
    }
}

pub async fn generate_goal_tasks(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GoalQuery>,
    Json(request): Json<GenerateGoalTasksRequest>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("POST /api/goals/{}/tasks/generate - {:?}", id, request);

    match state.goal_service.generate_goal_tasks(id, user_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to generate goal tasks", e),
    }
}

pub async fn toggle_goal_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(i64, i64)>,
    Query(query): Query<GoalQuery>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("PUT /api/goals/{}/tasks/{}/toggle", id, task_id);

    match state.goal_service.toggle_goal_task(id, user_id, task_id).await {
        Ok(outcome) => {
            let response = ToggleGoalTaskResponse {
                task: outcome.task,
                goal: outcome.goal,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("Failed to toggle goal task", e),
    }
}

pub async fn delete_goal_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(i64, i64)>,
    Query(query): Query<GoalQuery>,
) -> impl IntoResponse {
    let user_id = state.goal_user(query.user_id);
    info!("DELETE /api/goals/{}/tasks/{}", id, task_id);

    match state.goal_service.delete_goal_task(id, user_id, task_id).await {
        Ok(()) => {
            let response = DeleteResponse {
                success_message: "Task deleted successfully".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("Failed to delete goal task", e),
    }
}
