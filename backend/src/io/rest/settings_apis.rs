//! # REST API for UI Settings

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::info;

use shared::UiSettings;

use super::error::error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_settings).put(update_settings))
        .route("/theme", get(get_theme_palette))
}

pub async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/settings");

    match state.settings_service.load() {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => error_response("Failed to load settings", e),
    }
}

pub async fn update_settings(State(state): State<AppState>, Json(settings): Json<UiSettings>) -> impl IntoResponse {
    info!("PUT /api/settings - {:?}", settings);

    match state.settings_service.save(&settings) {
        Ok(saved) => (StatusCode::OK, Json(saved)).into_response(),
        Err(e) => error_response("Failed to save settings", e),
    }
}

/// Colors for the saved theme
pub async fn get_theme_palette(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/settings/theme");

    match state.settings_service.palette() {
        Ok(palette) => (StatusCode::OK, Json(palette)).into_response(),
        Err(e) => error_response("Failed to load theme", e),
    }
}
