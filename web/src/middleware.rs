//! Bearer token authentication.
//!
//! ```ignore
//! let api = Router::new()
//!     .route("/users/:id", get(get_user))
//!     .route_layer(axum::middleware::from_fn_with_state(tokens, require_bearer));
//! ```
//!
//! Requests without `Authorization: Bearer <jwt>`, or with a token that fails
//! verification, stop here with 401. Accepted requests carry an
//! [`AuthUser`] extension for the handler.

use crate::error::AppError;
use crate::extractors::AuthUser;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use recsys_services::TokenIssuer;
use std::sync::Arc;

fn bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verify the bearer token and attach [`AuthUser`] to the request.
pub async fn require_bearer(
    State(tokens): State<Arc<TokenIssuer>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer(&request) else {
        return AppError::unauthorized("Missing or invalid bearer token").into_response();
    };

    match tokens.verify(token) {
        Ok(user_id) => {
            tracing::debug!(user_id, "Bearer token accepted");
            request.extensions_mut().insert(AuthUser(user_id));
            next.run(request).await
        }
        Err(_) => AppError::unauthorized("Missing or invalid bearer token").into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use recsys_core::environment::SystemClock;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(tokens: Arc<TokenIssuer>) -> Router {
        Router::new()
            .route(
                "/me",
                get(|AuthUser(id): AuthUser| async move { id.to_string() }),
            )
            .route_layer(axum::middleware::from_fn_with_state(tokens, require_bearer))
    }

    fn issuer(secret: &[u8]) -> Arc<TokenIssuer> {
        Arc::new(TokenIssuer::new(secret, Duration::from_secs(60), Arc::new(SystemClock)).unwrap())
    }

    async fn status(app: Router, authorization: Option<String>) -> StatusCode {
        let mut request = Request::builder().uri("/me");
        if let Some(value) = authorization {
            request = request.header(header::AUTHORIZATION, value);
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn valid_token_reaches_the_handler() {
        let tokens = issuer(b"secret");
        let token = tokens.issue(9).unwrap();
        assert_eq!(status(app(tokens), Some(format!("Bearer {token}"))).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_malformed_and_foreign_tokens_are_rejected() {
        let tokens = issuer(b"secret");
        let foreign = issuer(b"other").issue(9).unwrap();

        assert_eq!(status(app(tokens.clone()), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(app(tokens.clone()), Some("Basic abc".to_string())).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(app(tokens), Some(format!("Bearer {foreign}"))).await,
            StatusCode::UNAUTHORIZED
        );
    }
}
