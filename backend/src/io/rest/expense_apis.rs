//! # REST API for Expenses
//!
//! CRUD, filtered listing, the summary report and CSV export/import.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use shared::{DeleteResponse, ExpenseInput, ExpenseListRequest};

use super::error::error_response;
use super::today;
use crate::AppState;

const DEFAULT_RECENT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense).delete(clear_expenses))
        .route("/report", get(get_report))
        .route("/recent", get(recent_expenses))
        .route("/export", get(export_expenses))
        .route("/import", post(import_expenses))
        .route("/:id", get(get_expense).put(update_expense).delete(delete_expense))
}

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(request): Query<ExpenseListRequest>,
) -> impl IntoResponse {
    info!("GET /api/expenses - {:?}", request);

    match state.expense_service.list_expenses(request, today()).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to list expenses", e),
    }
}

pub async fn create_expense(
    State(state): State<AppState>,
    Json(input): Json<ExpenseInput>,
) -> impl IntoResponse {
    info!("POST /api/expenses - {:?}", input);

    match state.expense_service.create_expense(input).await {
        Ok(expense) => (StatusCode::CREATED, Json(expense)).into_response(),
        Err(e) => error_response("Failed to create expense", e),
    }
}

pub async fn get_expense(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    info!("GET /api/expenses/{}", id);

    match state.expense_service.get_expense(id).await {
        Ok(expense) => (StatusCode::OK, Json(expense)).into_response(),
        Err(e) => error_response("Failed to get expense", e),
    }
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ExpenseInput>,
) -> impl IntoResponse {
    info!("PUT /api/expenses/{} - {:?}", id, input);

    match state.expense_service.update_expense(id, input).await {
        Ok(expense) => (StatusCode::OK, Json(expense)).into_response(),
        Err(e) => error_response("Failed to update expense", e),
    }
}

pub async fn delete_expense(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    info!("DELETE /api/expenses/{}", id);

    match state.expense_service.delete_expense(id).await {
        Ok(()) => {
            let response = DeleteResponse {
                success_message: "Expense deleted successfully".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("Failed to delete expense", e),
    }
}

pub async fn clear_expenses(State(state): State<AppState>) -> impl IntoResponse {
    info!("DELETE /api/expenses");

    match state.expense_service.clear_all().await {
        Ok(removed) => {
            let response = DeleteResponse {
                success_message: format!("Deleted {} expenses", removed),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response("Failed to clear expenses", e),
    }
}

pub async fn get_report(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/expenses/report");

    match state.expense_service.summary_report(today()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response("Failed to build expense report", e),
    }
}

pub async fn recent_expenses(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT);
    info!("GET /api/expenses/recent - limit {}", limit);

    match state.expense_service.recent(limit).await {
        Ok(expenses) => (StatusCode::OK, Json(expenses)).into_response(),
        Err(e) => error_response("Failed to get recent expenses", e),
    }
}

pub async fn export_expenses(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/expenses/export");

    match state.export_service.export_csv(today()).await {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"expenses.csv\""),
            ],
            csv,
        )
            .into_response(),
        Err(e) => error_response("Failed to export expenses", e),
    }
}

/// Body is raw CSV text
pub async fn import_expenses(State(state): State<AppState>, body: String) -> impl IntoResponse {
    info!("POST /api/expenses/import - {} bytes", body.len());

    match state.export_service.import_csv(&body).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response("Failed to import expenses", e),
    }
}
