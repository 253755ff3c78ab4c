//! Registration and login (`/api/auth`). No token required.

use crate::error::AppError;
use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use recsys_core::model::UserSummary;
use recsys_services::IdentityService;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterRequest {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    /// Signed session token
    pub token: String,
}

/// Routes of the SSO service.
pub fn router(identity: IdentityService) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .with_state(identity)
}

/// Register a new user.
///
/// ```text
/// POST /api/auth/register
/// {"name": "Ada", "email": "ada@example.com", "password": "..."}
/// ```
///
/// 201 with `{id, name, email}`, 409 if the email is taken, 422 on blank fields.
pub async fn register(
    State(identity): State<IdentityService>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    let user = identity
        .register(&request.name, &request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for a token.
///
/// ```text
/// POST /api/auth/login
/// {"email": "ada@example.com", "password": "..."}
/// ```
///
/// 401 for an unknown email and for a wrong password alike.
pub async fn login(
    State(identity): State<IdentityService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let token = identity.login(&request.email, &request.password).await?;
    Ok(Json(LoginResponse { token }))
}
