//! # REST API for Tasks

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use tracing::info;

use shared::{DeleteResponse, SetTaskStatusRequest, TaskInput, TaskListRequest};

use super::error::error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", get(get_task).put(update_task).delete(delete_task))
        .route("/:id/status", put(set_task_status))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(request): Query<TaskListRequest>,
) -> impl IntoResponse {
    info!("GET /api/tasks - {:?}", request);

    match state.task_service.list_tasks(request).await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => error_response("Failed to list tasks", e),
    }
}

pub async fn create_task(State(state): State<AppState>, Json(input): Json<TaskInput>) -> impl IntoResponse {
    info!("POST /api/tasks - {:?}", input);

    match state.task_service.create_task(input).await {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => error_response("Failed to create task", e),
    }
}

pub async fn get_task(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    info!("GET /api/tasks/{}", id);

    match state.task_service.get_task(id).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => error_response("Failed to get task", e),
    }
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<TaskInput>,
) -> impl IntoResponse {
    info!("PUT /api/tasks/{} - {:?}", id, input);

    match state.task_service.update_task(id, input).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => error_response("Failed to update task", e),
    }
}

pub async fn delete_task(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    info!("DELETE /api/tasks/{}", id);

    match state.task_service.delete_task(id).await {
        Ok(()) => {
            let response = DeleteResponse {
                success_message: "Task deleted successfully".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("Failed to delete task", e),
    }
}

pub async fn set_task_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<SetTaskStatusRequest>,
) -> impl IntoResponse {
    info!("PUT /api/tasks/{}/status - {}", id, request.status);

    match state.task_service.set_status(id, request.status).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => error_response("Failed to change task status", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::test_support::{app, read_json, send, TestResult, NO_BODY};
    use axum::http::Method;
    use shared::{Priority, Task, TaskStatus};

    #[tokio::test]
    async fn test_task_lifecycle() -> TestResult {
        let (app, _, _dir) = app().await?;
        let input = TaskInput {
            title: "Renew passport".to_string(),
            priority: Priority::High,
            due_date: Some("2025-09-30".to_string()),
            ..Default::default()
        };
        let response = send(&app, Method::POST, "/api/tasks", Some(&input)).await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let task: Task = read_json(response).await?;
        assert_eq!(task.status, TaskStatus::Pending);

        let uri = format!("/api/tasks/{}/status", task.id);
        let response = send(&app, Method::PUT, &uri, Some(&SetTaskStatusRequest { status: TaskStatus::Completed })).await?;
        let done: Task = read_json(response).await?;
        assert_eq!(done.status, TaskStatus::Completed);

        let response = send(&app, Method::GET, "/api/tasks?status=Pending", NO_BODY).await?;
        let pending: Vec<Task> = read_json(response).await?;
        assert!(pending.is_empty());

        let response = send(&app, Method::DELETE, &format!("/api/tasks/{}", task.id), NO_BODY).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&app, Method::GET, &format!("/api/tasks/{}", task.id), NO_BODY).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_blank_title() -> TestResult {
        let (app, _, _dir) = app().await?;
        let response = send(&app, Method::POST, "/api/tasks", Some(&TaskInput::default())).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
