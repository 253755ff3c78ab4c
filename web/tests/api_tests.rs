//! HTTP contract of the service routers against in-memory backends.

#![allow(clippy::unwrap_used)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::{TestRequest, TestServer};
use recsys_core::environment::SystemClock;
use recsys_core::model::{Interaction, Product, ProductDetails, Recommendation, User};
use recsys_services::mocks::InMemoryDatabase;
use recsys_services::{
    AnalyticsService, CacheConfig, IdentityService, PasswordHasher, ProductService,
    RecommendationService, ScoringConfig, TokenIssuer, UserService,
};
use recsys_testing::{InMemoryCache, InMemoryEventBus};
use recsys_web::handlers::{analytics, auth, products, recommendations, users};
use recsys_web::handlers::auth::LoginResponse;
use recsys_web::handlers::recommendations::LatestRecommendation;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

struct Platform {
    sso: TestServer,
    users: TestServer,
    products: TestServer,
    recommendations: TestServer,
    analytics: TestServer,
    analytics_service: AnalyticsService,
    token: String,
}

impl Platform {
    async fn start() -> Self {
        let db = InMemoryDatabase::new();
        let bus = Arc::new(InMemoryEventBus::new());
        let cache = Arc::new(InMemoryCache::new());
        let tokens = Arc::new(
            TokenIssuer::new(b"api-secret", Duration::from_secs(600), Arc::new(SystemClock))
                .unwrap(),
        );

        let identity = IdentityService::new(
            Arc::new(db.clone()),
            bus.clone(),
            PasswordHasher::new(4),
            tokens.as_ref().clone(),
        );
        let analytics_service = AnalyticsService::new(Arc::new(db.clone()));
        let server = |router| TestServer::new(recsys_web::app(router)).unwrap();

        let sso = server(auth::router(identity));
        sso.post("/api/auth/register")
            .json(&json!({"name": "Ada", "email": "ada@example.com", "password": "s3cret"}))
            .await
            .assert_status(StatusCode::CREATED);
        let login: LoginResponse = sso
            .post("/api/auth/login")
            .json(&json!({"email": "ada@example.com", "password": "s3cret"}))
            .await
            .json();

        Self {
            users: server(users::router(
                UserService::new(
                    Arc::new(db.clone()),
                    cache.clone(),
                    bus.clone(),
                    CacheConfig::default(),
                ),
                tokens.clone(),
            )),
            products: server(products::router(
                ProductService::new(Arc::new(db.clone()), bus.clone()),
                tokens.clone(),
            )),
            recommendations: server(recommendations::router(
                RecommendationService::new(
                    Arc::new(db.clone()),
                    cache,
                    bus,
                    ScoringConfig::default(),
                    CacheConfig::default(),
                ),
                tokens.clone(),
            )),
            analytics: server(analytics::router(analytics_service.clone(), tokens)),
            analytics_service,
            sso,
            token: login.token,
        }
    }

    fn authorized(&self, request: TestRequest) -> TestRequest {
        request.add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token)).unwrap(),
        )
    }

    async fn create_product(&self, name: &str, category: &str) -> Product {
        let response = self
            .authorized(self.products.post("/api/products"))
            .json(&json!({"name": name, "price": 12.5, "category": category}))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let platform = Platform::start().await;

    let unknown = platform
        .sso
        .post("/api/auth/login")
        .json(&json!({"email": "nobody@example.com", "password": "s3cret"}))
        .await;
    let wrong = platform
        .sso
        .post("/api/auth/login")
        .json(&json!({"email": "ada@example.com", "password": "guess"}))
        .await;

    unknown.assert_status(StatusCode::UNAUTHORIZED);
    wrong.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.json::<Value>(), wrong.json::<Value>());
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let platform = Platform::start().await;
    let response = platform
        .sso
        .post("/api/auth/register")
        .json(&json!({"name": "Other", "email": "ada@example.com", "password": "x"}))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "CONFLICT");
}

#[tokio::test]
async fn api_requires_a_bearer_token() {
    let platform = Platform::start().await;

    platform
        .users
        .get("/api/users/1")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    platform
        .products
        .get("/api/products")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer not-a-jwt"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    platform.users.get("/health").await.assert_status_ok();

    let user: User = platform
        .authorized(platform.users.get("/api/users/1"))
        .await
        .json();
    assert_eq!(user.email, "ada@example.com");
}

#[tokio::test]
async fn path_and_query_validation() {
    let platform = Platform::start().await;

    for path in ["/api/users/0", "/api/users/-4", "/api/users/abc"] {
        platform
            .authorized(platform.users.get(path))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
    for query in ["page=0", "pageSize=101", "pageSize=0"] {
        platform
            .authorized(platform.users.get(&format!("/api/users?{query}")))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
    platform
        .authorized(platform.users.post("/api/users/1/like"))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn interactions_and_duplicate_like() {
    let platform = Platform::start().await;
    let product = platform.create_product("Dune", "books").await;

    let like = || {
        platform
            .authorized(platform.users.post("/api/users/1/like"))
            .add_query_param("product_id", product.id)
    };
    like().await.assert_status(StatusCode::CREATED);
    like().await.assert_status(StatusCode::CONFLICT);

    platform
        .authorized(platform.users.post("/api/users/1/purchase"))
        .add_query_param("product_id", product.id)
        .await
        .assert_status(StatusCode::CREATED);

    let actions: Value = platform
        .authorized(platform.users.get("/api/users/1/actions"))
        .add_query_param("product_id", product.id)
        .await
        .json();
    assert_eq!(actions["likes"].as_array().unwrap().len(), 1);
    assert_eq!(actions["purchases"].as_array().unwrap().len(), 1);

    let details: ProductDetails = platform
        .authorized(platform.products.get(&format!("/api/products/{}", product.id)))
        .await
        .json();
    assert_eq!(details.purchase_count, 1);
    assert_eq!(details.likes.len(), 1);
}

#[tokio::test]
async fn product_delete_then_not_found() {
    let platform = Platform::start().await;
    let product = platform.create_product("Dune", "books").await;
    let path = format!("/api/products/{}", product.id);

    platform
        .authorized(platform.products.delete(&path))
        .await
        .assert_status_ok();
    platform
        .authorized(platform.products.delete(&path))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    platform
        .authorized(platform.products.get(&path))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recommendations_for_new_user_and_generated_snapshot() {
    let platform = Platform::start().await;
    let product = platform.create_product("Dune", "books").await;

    let latest: LatestRecommendation = platform
        .authorized(platform.recommendations.get("/api/recommendations/7/latest"))
        .await
        .json();
    assert!(latest.recommended_product_ids.is_empty());

    let response = platform
        .authorized(platform.recommendations.post("/api/recommendations/7/generate"))
        .add_query_param("product_id", product.id)
        .await;
    response.assert_status(StatusCode::CREATED);
    let snapshot: Recommendation = response.json();
    assert_eq!(snapshot.product_ids, vec![product.id]);

    let history: Vec<Recommendation> = platform
        .authorized(platform.recommendations.get("/api/recommendations/7"))
        .await
        .json();
    assert_eq!(history, vec![snapshot]);
}

#[tokio::test]
async fn analytics_missing_until_first_interaction() {
    let platform = Platform::start().await;

    platform
        .authorized(platform.analytics.get("/api/analytics/products/3"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    platform
        .analytics_service
        .record_interaction(Interaction::Purchase, 1, 3)
        .await
        .unwrap();

    let counters: Value = platform
        .authorized(platform.analytics.get("/api/analytics/products/3"))
        .await
        .json();
    assert_eq!(counters["purchases"], 1);
    let user: Value = platform
        .authorized(platform.analytics.get("/api/analytics/users/1"))
        .await
        .json();
    assert_eq!(user["total_purchases"], 1);
}
