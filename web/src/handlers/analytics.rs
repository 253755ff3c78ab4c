//! Interaction counters (`/api/analytics`).

use crate::error::AppError;
use crate::extractors::Id;
use crate::middleware::require_bearer;
use axum::{Json, Router, extract::State, middleware::from_fn_with_state, routing::get};
use recsys_core::model::{ProductAnalytics, UserAnalytics};
use recsys_services::{AnalyticsService, TokenIssuer};
use std::sync::Arc;

/// Routes of the analytics service.
pub fn router(analytics: AnalyticsService, tokens: Arc<TokenIssuer>) -> Router {
    Router::new()
        .route("/api/analytics/products/:id", get(product_analytics))
        .route("/api/analytics/users/:id", get(user_analytics))
        .route_layer(from_fn_with_state(tokens, require_bearer))
        .with_state(analytics)
}

/// `GET /api/analytics/products/:id`. 404 before the first interaction.
pub async fn product_analytics(
    State(analytics): State<AnalyticsService>,
    Id(id): Id,
) -> Result<Json<ProductAnalytics>, AppError> {
    Ok(Json(analytics.get_product_analytics(id).await?))
}

/// `GET /api/analytics/users/:id`. 404 before the first interaction.
pub async fn user_analytics(
    State(analytics): State<AnalyticsService>,
    Id(id): Id,
) -> Result<Json<UserAnalytics>, AppError> {
    Ok(Json(analytics.get_user_analytics(id).await?))
}
