//! Request extractors that validate before the handler runs.
//!
//! Every rejection is an [`AppError`], so clients get the same JSON error body
//! for a bad path segment as for a failed service call.
//!
//! - [`Id`]: positive integer path segment
//! - [`Pagination`]: `page` (default 1) and `pageSize` (default 10, at most 100)
//! - [`ProductRef`]: required positive `product_id` query parameter
//! - [`ProductFilter`]: optional positive `product_id` query parameter
//! - [`AuthUser`]: subject of the bearer token, set by
//!   [`require_bearer`](crate::middleware::require_bearer)

use crate::error::AppError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
};
use recsys_core::model::{Page, ProductId, UserId};
use serde::Deserialize;

/// Largest accepted `pageSize`.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default `pageSize`.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

fn positive(name: &str, value: i64) -> Result<i64, AppError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(AppError::validation(format!("{name} must be a positive integer")))
    }
}

/// A positive integer identifier taken from the route's single path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for Id
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::validation("id must be a positive integer"))?;
        positive("id", raw).map(Self)
    }
}

#[derive(Debug, Deserialize)]
struct RawPagination {
    page: Option<i64>,
    #[serde(rename = "pageSize")]
    page_size: Option<i64>,
}

/// Validated `?page=&pageSize=` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination(pub Page);

impl Pagination {
    fn from_raw(raw: &RawPagination) -> Result<Self, AppError> {
        let page = raw.page.unwrap_or(1);
        let size = raw.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page < 1 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(AppError::validation(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let offset = (page - 1)
            .checked_mul(size)
            .ok_or_else(|| AppError::validation("page is out of range"))?;

        Ok(Self(Page {
            limit: size,
            offset,
        }))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawPagination>::try_from_uri(&parts.uri)
            .map_err(|_| AppError::validation("page and pageSize must be integers"))?;
        Self::from_raw(&raw)
    }
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    product_id: Option<i64>,
}

fn product_query(parts: &Parts) -> Result<Option<ProductId>, AppError> {
    let Query(raw) = Query::<RawProduct>::try_from_uri(&parts.uri)
        .map_err(|_| AppError::validation("product_id must be a positive integer"))?;
    raw.product_id.map(|id| positive("product_id", id)).transpose()
}

/// Required `?product_id=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductRef(pub ProductId);

#[async_trait]
impl<S> FromRequestParts<S> for ProductRef
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        product_query(parts)?
            .map(Self)
            .ok_or_else(|| AppError::validation("product_id is required"))
    }
}

/// Optional `?product_id=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductFilter(pub Option<ProductId>);

#[async_trait]
impl<S> FromRequestParts<S> for ProductFilter
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        product_query(parts).map(Self)
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| AppError::unauthorized("Missing or invalid bearer token"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn pagination(uri: &str) -> Result<Pagination, AppError> {
        let (mut parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        Pagination::from_request_parts(&mut parts, &()).await
    }

    async fn product_ref(uri: &str) -> Result<ProductRef, AppError> {
        let (mut parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        ProductRef::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn pagination_defaults() {
        let Pagination(page) = pagination("/users").await.unwrap();
        assert_eq!(page, Page { limit: 10, offset: 0 });
    }

    #[tokio::test]
    async fn pagination_offsets() {
        let Pagination(page) = pagination("/users?page=3&pageSize=25").await.unwrap();
        assert_eq!(page, Page { limit: 25, offset: 50 });
    }

    #[tokio::test]
    async fn pagination_bounds() {
        for uri in [
            "/users?page=0",
            "/users?pageSize=0",
            "/users?pageSize=101",
            "/users?page=-2",
            "/users?page=two",
        ] {
            let err = pagination(uri).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        }
        assert!(pagination("/users?pageSize=100").await.is_ok());
    }

    #[tokio::test]
    async fn product_ref_is_required_and_positive() {
        assert_eq!(product_ref("/x?product_id=7").await.unwrap(), ProductRef(7));
        assert!(product_ref("/x").await.is_err());
        assert!(product_ref("/x?product_id=0").await.is_err());
        assert!(product_ref("/x?product_id=abc").await.is_err());
    }

    #[tokio::test]
    async fn auth_user_requires_the_extension() {
        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        parts.extensions.insert(AuthUser(42));
        assert_eq!(
            AuthUser::from_request_parts(&mut parts, &()).await.unwrap(),
            AuthUser(42)
        );
    }
}
