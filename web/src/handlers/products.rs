//! Catalogue (`/api/products`).

use crate::error::AppError;
use crate::extractors::{Id, Pagination};
use crate::middleware::require_bearer;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
};
use recsys_core::model::{Product, ProductDetails, ProductInput};
use recsys_services::{ProductService, TokenIssuer};
use serde::Serialize;
use std::sync::Arc;

/// Confirmation body for deletes.
#[derive(Debug, Serialize)]
pub struct Deleted {
    /// Human-readable confirmation
    pub message: &'static str,
}

/// Routes of the product service.
pub fn router(products: ProductService, tokens: Arc<TokenIssuer>) -> Router {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route_layer(from_fn_with_state(tokens, require_bearer))
        .with_state(products)
}

/// `POST /api/products`
pub async fn create_product(
    State(products): State<ProductService>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = products.create_product(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /api/products?page=&pageSize=`
pub async fn list_products(
    State(products): State<ProductService>,
    Pagination(page): Pagination,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(products.list_products(page).await?))
}

/// `GET /api/products/:id` with likes, dislikes and purchase count.
pub async fn get_product(
    State(products): State<ProductService>,
    Id(id): Id,
) -> Result<Json<ProductDetails>, AppError> {
    Ok(Json(products.get_product(id).await?))
}

/// `PUT /api/products/:id`
pub async fn update_product(
    State(products): State<ProductService>,
    Id(id): Id,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(products.update_product(id, &input).await?))
}

/// `DELETE /api/products/:id`. 404 if the product does not exist.
pub async fn delete_product(
    State(products): State<ProductService>,
    Id(id): Id,
) -> Result<Json<Deleted>, AppError> {
    products.delete_product(id).await?;
    Ok(Json(Deleted {
        message: "Product deleted successfully",
    }))
}
