//! Translation of domain failures into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use shared::ErrorResponse;

use crate::domain::DomainError;

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log `err` with `context` and turn it into a JSON error body
pub fn error_response(context: &str, err: DomainError) -> Response {
    error!("{}: {}", context, err);
    let status = status_for(&err);
    let message = match err {
        DomainError::Storage(_) => "Internal storage error".to_string(),
        other => other.to_string(),
    };
    (status, Json(ErrorResponse { error: message })).into_response()
}
