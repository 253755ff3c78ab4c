//! User profiles and interactions (`/api/users`).

use crate::error::AppError;
use crate::extractors::{Id, Pagination, ProductFilter, ProductRef};
use crate::middleware::require_bearer;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use recsys_core::model::{Dislike, Like, Purchase, User, UserActions, UserUpdate};
use recsys_services::{TokenIssuer, UserService};
use std::sync::Arc;

/// Routes of the user service.
pub fn router(users: UserService, tokens: Arc<TokenIssuer>) -> Router {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/:id", get(get_user).put(update_user))
        .route("/api/users/:id/like", post(like_product))
        .route("/api/users/:id/dislike", post(dislike_product))
        .route("/api/users/:id/purchase", post(purchase_product))
        .route("/api/users/:id/actions", get(get_user_actions))
        .route("/api/users/:id/purchases", get(get_user_purchases))
        .route_layer(from_fn_with_state(tokens, require_bearer))
        .with_state(users)
}

/// `GET /api/users?page=&pageSize=`
pub async fn list_users(
    State(users): State<UserService>,
    Pagination(page): Pagination,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(users.list_users(page).await?))
}

/// `GET /api/users/:id`
pub async fn get_user(
    State(users): State<UserService>,
    Id(id): Id,
) -> Result<Json<User>, AppError> {
    Ok(Json(users.get_user(id).await?))
}

/// `PUT /api/users/:id` with `{name, email}`.
pub async fn update_user(
    State(users): State<UserService>,
    Id(id): Id,
    Json(update): Json<UserUpdate>,
) -> Result<Json<User>, AppError> {
    Ok(Json(users.update_user(id, &update).await?))
}

/// `POST /api/users/:id/like?product_id=`. 409 if already liked.
pub async fn like_product(
    State(users): State<UserService>,
    Id(user_id): Id,
    ProductRef(product_id): ProductRef,
) -> Result<(StatusCode, Json<Like>), AppError> {
    let like = users.like_product(user_id, product_id).await?;
    Ok((StatusCode::CREATED, Json(like)))
}

/// `POST /api/users/:id/dislike?product_id=`. 409 if already disliked.
pub async fn dislike_product(
    State(users): State<UserService>,
    Id(user_id): Id,
    ProductRef(product_id): ProductRef,
) -> Result<(StatusCode, Json<Dislike>), AppError> {
    let dislike = users.dislike_product(user_id, product_id).await?;
    Ok((StatusCode::CREATED, Json(dislike)))
}

/// `POST /api/users/:id/purchase?product_id=`
pub async fn purchase_product(
    State(users): State<UserService>,
    Id(user_id): Id,
    ProductRef(product_id): ProductRef,
) -> Result<(StatusCode, Json<Purchase>), AppError> {
    let purchase = users.purchase_product(user_id, product_id).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// `GET /api/users/:id/actions[?product_id=]`
pub async fn get_user_actions(
    State(users): State<UserService>,
    Id(user_id): Id,
    ProductFilter(product_id): ProductFilter,
) -> Result<Json<UserActions>, AppError> {
    Ok(Json(users.get_user_actions(user_id, product_id).await?))
}

/// `GET /api/users/:id/purchases?page=&pageSize=`
pub async fn get_user_purchases(
    State(users): State<UserService>,
    Id(user_id): Id,
    Pagination(page): Pagination,
) -> Result<Json<Vec<Purchase>>, AppError> {
    Ok(Json(users.get_user_purchases(user_id, page).await?))
}
