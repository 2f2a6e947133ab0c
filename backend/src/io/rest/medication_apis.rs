//! # REST API for Medications

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::info;

use shared::{DeleteResponse, MedicationInput, MedicationListRequest};

use super::error::error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_medications).post(create_medication))
        .route("/:id", get(get_medication).put(update_medication).delete(delete_medication))
}

pub async fn list_medications(
    State(state): State<AppState>,
    Query(request): Query<MedicationListRequest>,
) -> impl IntoResponse {
    info!("GET /api/medications - {:?}", request);

    match state.medication_service.list_medications(&request).await {
        Ok(medications) => (StatusCode::OK, Json(medications)).into_response(),
        Err(e) => error_response("Failed to list medications", e),
    }
}

pub async fn create_medication(
    State(state): State<AppState>,
    Json(input): Json<MedicationInput>,
) -> impl IntoResponse {
    info!("POST /api/medications - {:?}", input);

    match state.medication_service.create_medication(input).await {
        Ok(medication) => (StatusCode::CREATED, Json(medication)).into_response(),
        Err(e) => error_response("Failed to add medication", e),
    }
}

pub async fn get_medication(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    info!("GET /api/medications/{}", id);

    match state.medication_service.get_medication(id).await {
        Ok(medication) => (StatusCode::OK, Json(medication)).into_response(),
        Err(e) => error_response("Failed to get medication", e),
    }
}

pub async fn update_medication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<MedicationInput>,
) -> impl IntoResponse {
    info!("PUT /api/medications/{} - {:?}", id, input);

    match state.medication_service.update_medication(id, input).await {
        Ok(medication) => (StatusCode::OK, Json(medication)).into_response(),
        Err(e) => error_response("Failed to update medication", e),
    }
}

pub async fn delete_medication(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    info!("DELETE /api/medications/{}", id);

    match state.medication_service.delete_medication(id).await {
        Ok(()) => {
            let response = DeleteResponse {
                success_message: "Medication deleted successfully".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("Failed to delete medication", e),
    }
}
