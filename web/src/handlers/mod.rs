//! HTTP request handlers, one module per service.
//!
//! Each module exposes a `router` that mounts its routes under `/api`.
//! Everything except `/api/auth/*` and `/health` sits behind
//! [`require_bearer`](crate::middleware::require_bearer).

pub mod analytics;
pub mod auth;
pub mod health;
pub mod products;
pub mod recommendations;
pub mod users;

pub use health::{health_check, metrics_router};
