//! Recommendations (`/api/recommendations`).

use crate::error::AppError;
use crate::extractors::{Id, ProductRef};
use crate::middleware::require_bearer;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use recsys_core::model::{ProductId, Recommendation};
use recsys_services::{RecommendationService, TokenIssuer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `GET /api/recommendations/:user_id/latest`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LatestRecommendation {
    /// Products for the user's top categories, newest first
    pub recommended_product_ids: Vec<ProductId>,
}

/// Routes of the recommendation service.
pub fn router(recommendations: RecommendationService, tokens: Arc<TokenIssuer>) -> Router {
    Router::new()
        .route("/api/recommendations/:user_id", get(list_recommendations))
        .route("/api/recommendations/:user_id/latest", get(get_latest))
        .route("/api/recommendations/:user_id/generate", post(generate))
        .route_layer(from_fn_with_state(tokens, require_bearer))
        .with_state(recommendations)
}

/// `GET /api/recommendations/:user_id/latest`. Empty for a user without history.
pub async fn get_latest(
    State(recommendations): State<RecommendationService>,
    Id(user_id): Id,
) -> Result<Json<LatestRecommendation>, AppError> {
    let recommended_product_ids = recommendations.get_latest_recommendation(user_id).await?;
    Ok(Json(LatestRecommendation {
        recommended_product_ids,
    }))
}

/// `POST /api/recommendations/:user_id/generate?product_id=`
pub async fn generate(
    State(recommendations): State<RecommendationService>,
    Id(user_id): Id,
    ProductRef(product_id): ProductRef,
) -> Result<(StatusCode, Json<Recommendation>), AppError> {
    let recommendation = recommendations
        .generate_recommendations(user_id, product_id)
        .await?;
    Ok((StatusCode::CREATED, Json(recommendation)))
}

/// `GET /api/recommendations/:user_id`, newest snapshot first.
pub async fn list_recommendations(
    State(recommendations): State<RecommendationService>,
    Id(user_id): Id,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    Ok(Json(recommendations.list_recommendations(user_id).await?))
}
