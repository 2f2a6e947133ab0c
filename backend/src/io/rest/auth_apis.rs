//! # REST API for Accounts
//!
//! Registration and login.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use tracing::info;

use shared::{LoginRequest, RegisterRequest};

use super::error::error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/register - {}", request.email);

    match state.auth_service.register(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to register user", e),
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/login - {}", request.identifier);

    match state.auth_service.login(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Login failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::test_support::{app, read_json, send, TestResult};
    use axum::http::Method;
    use shared::{ErrorResponse, LoginResponse, RegisterResponse};

    fn registration(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Nadia".to_string(),
            email: email.to_string(),
            password: "secret12".to_string(),
            confirm_password: "secret12".to_string(),
            date_of_birth: None,
            phone: Some("01712345678".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() -> TestResult {
        let (app, _, _dir) = app().await?;

        let response = send(&app, Method::POST, "/api/auth/register", Some(&registration("nadia@example.com"))).await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let registered: RegisterResponse = read_json(response).await?;
        assert_eq!(registered.user.name, "Nadia");

        let login = LoginRequest {
            identifier: "nadia@example.com".to_string(),
            password: "secret12".to_string(),
        };
        let response = send(&app, Method::POST, "/api/auth/login", Some(&login)).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let logged_in: LoginResponse = read_json(response).await?;
        assert_eq!(logged_in.user.id, registered.user.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_and_bad_credentials() -> TestResult {
        let (app, _, _dir) = app().await?;
        send(&app, Method::POST, "/api/auth/register", Some(&registration("a@example.com"))).await?;

        let response = send(&app, Method::POST, "/api/auth/register", Some(&registration("a@example.com"))).await?;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(&app, Method::POST, "/api/auth/register", Some(&registration("not-an-email"))).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = read_json(response).await?;
        assert_eq!(body.error, "Invalid email format");

        let login = LoginRequest {
            identifier: "a@example.com".to_string(),
            password: "wrong-password".to_string(),
        };
        let response = send(&app, Method::POST, "/api/auth/login", Some(&login)).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
