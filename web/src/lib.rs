//! Axum HTTP surface of the recommendation platform.
//!
//! Each service binary mounts one router from [`handlers`] and wraps it with
//! [`app`], which adds `/health` and request tracing.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at the service router
//! 2. **Authenticate** via [`middleware::require_bearer`] (all but `/api/auth/*`)
//! 3. **Validate** path and query through the [`extractors`]
//! 4. **Call** the domain service
//! 5. **Map** the result (or [`ServiceError`](recsys_services::ServiceError)
//!    through [`AppError`]) to an HTTP response
//!
//! # Example
//!
//! ```ignore
//! let router = recsys_web::app(handlers::users::router(users, tokens));
//! axum::serve(listener, router).await?;
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

pub use error::AppError;
pub use extractors::{AuthUser, Id, Pagination, ProductFilter, ProductRef};
pub use middleware::require_bearer;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

/// Add `/health` and HTTP tracing to a service router.
pub fn app(api: Router) -> Router {
    api.route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
}
