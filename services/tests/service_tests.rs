//! Service behaviour against the in-memory repositories, bus and cache.

#![allow(clippy::unwrap_used)]

use recsys_core::cache::keys;
use recsys_core::environment::SystemClock;
use recsys_core::event::DomainEvent;
use recsys_core::event_bus::EventBus;
use recsys_core::model::{Interaction, Page, ProductInput, UserUpdate};
use recsys_core::topic::{ANALYTICS_GROUP, INTERACTION_TOPICS, RECOMMENDATION_GROUP};
use recsys_runtime::{EventHandler, Shutdown, TopicConsumer, await_shutdown};
use recsys_services::mocks::InMemoryDatabase;
use recsys_services::{
    AnalyticsEventHandler, AnalyticsService, CacheConfig, IdentityService, PasswordHasher,
    ProductService, RecommendationEventHandler, RecommendationService, ScoringConfig,
    ServiceError, TokenIssuer, UserService,
};
use recsys_testing::{InMemoryCache, InMemoryEventBus, helpers};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    db: InMemoryDatabase,
    bus: Arc<InMemoryEventBus>,
    cache: Arc<InMemoryCache>,
    identity: IdentityService,
    users: UserService,
    products: ProductService,
    recommendations: RecommendationService,
    analytics: AnalyticsService,
}

impl Harness {
    fn new() -> Self {
        let db = InMemoryDatabase::new();
        let bus = Arc::new(InMemoryEventBus::new());
        let cache = Arc::new(InMemoryCache::new());
        let cache_config = CacheConfig {
            user_ttl: Duration::from_secs(60),
            recommendation_ttl: Duration::from_secs(120),
        };

        let tokens = TokenIssuer::new(
            b"test-secret",
            Duration::from_secs(3600),
            Arc::new(SystemClock),
        )
        .unwrap();

        Self {
            identity: IdentityService::new(
                Arc::new(db.clone()),
                bus.clone(),
                PasswordHasher::new(8),
                tokens,
            ),
            users: UserService::new(Arc::new(db.clone()), cache.clone(), bus.clone(), cache_config),
            products: ProductService::new(Arc::new(db.clone()), bus.clone()),
            recommendations: RecommendationService::new(
                Arc::new(db.clone()),
                cache.clone(),
                bus.clone(),
                ScoringConfig::default(),
                cache_config,
            ),
            analytics: AnalyticsService::new(Arc::new(db.clone())),
            db,
            bus,
            cache,
        }
    }

    async fn product(&self, name: &str, category: &str) -> i64 {
        self.products
            .create_product(&ProductInput {
                name: name.to_string(),
                description: String::new(),
                price: 10.0,
                category: category.to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn user(&self, email: &str) -> i64 {
        self.identity
            .register("Test", email, "password")
            .await
            .unwrap()
            .id
    }

    fn consumers(&self) -> (TopicConsumer, TopicConsumer) {
        let recommendation = TopicConsumer::new(
            "recommendation",
            RECOMMENDATION_GROUP,
            &INTERACTION_TOPICS,
            self.bus.clone() as Arc<dyn EventBus>,
            Arc::new(RecommendationEventHandler::new(self.recommendations.clone()))
                as Arc<dyn EventHandler>,
        )
        .with_retry_delay(Duration::from_millis(10));
        let analytics = TopicConsumer::new(
            "analytics",
            ANALYTICS_GROUP,
            &INTERACTION_TOPICS,
            self.bus.clone() as Arc<dyn EventBus>,
            Arc::new(AnalyticsEventHandler::new(self.analytics.clone())) as Arc<dyn EventHandler>,
        )
        .with_retry_delay(Duration::from_millis(10));
        (recommendation, analytics)
    }
}

#[tokio::test]
async fn like_and_dislike_replace_each_other() {
    let h = Harness::new();
    let user = h.user("a@example.com").await;
    let product = h.product("Dune", "books").await;

    h.users.like_product(user, product).await.unwrap();
    h.users.dislike_product(user, product).await.unwrap();

    let actions = h.users.get_user_actions(user, Some(product)).await.unwrap();
    assert!(actions.likes.is_empty());
    assert_eq!(actions.dislikes.len(), 1);

    h.users.like_product(user, product).await.unwrap();
    let actions = h.users.get_user_actions(user, None).await.unwrap();
    assert_eq!(actions.likes.len(), 1);
    assert!(actions.dislikes.is_empty());

    let kinds: Vec<String> = h
        .bus
        .published_events("user_updates")
        .iter()
        .map(|e| e.kind().to_string())
        .collect();
    assert_eq!(
        kinds,
        ["user_created", "user_liked", "user_disliked", "user_liked"]
    );
}

#[tokio::test]
async fn duplicate_like_is_a_conflict_without_event() {
    let h = Harness::new();
    let product = h.product("Dune", "books").await;

    let like = h.users.like_product(1, product).await.unwrap();
    let again = h.users.like_product(1, product).await;
    assert!(matches!(again, Err(ServiceError::Conflict(_))));

    let events = h.bus.published_events("user_updates");
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        DomainEvent::UserLiked {
            user_id: 1,
            product_id: product,
            like: Some(like),
        }
    );
}

#[tokio::test]
async fn user_profile_is_read_through_and_invalidated_on_update() {
    let h = Harness::new();
    let id = h.user("a@example.com").await;
    let key = keys::user(id);

    assert!(!h.cache.contains(&key));
    let user = h.users.get_user(id).await.unwrap();
    assert_eq!(user.email, "a@example.com");
    assert!(h.cache.contains(&key));
    assert_eq!(h.cache.ttl(&key), Some(Duration::from_secs(60)));

    let updated = h
        .users
        .update_user(
            id,
            &UserUpdate {
                name: "Renamed".to_string(),
                email: "b@example.com".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(!h.cache.contains(&key));
    assert_eq!(h.users.get_user(id).await.unwrap(), updated);
    assert!(
        h.bus
            .published_events("user_updates")
            .contains(&DomainEvent::UserUpdated { user: updated })
    );
}

#[tokio::test]
async fn cache_outage_degrades_to_store_reads() {
    let h = Harness::new();
    let id = h.user("a@example.com").await;
    h.cache.set_failing(true);

    assert_eq!(h.users.get_user(id).await.unwrap().id, id);
    assert!(h.recommendations.get_latest_recommendation(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn undecodable_cache_entry_is_a_miss() {
    let h = Harness::new();
    let id = h.user("a@example.com").await;
    h.cache.seed(&keys::user(id), "{not json", Duration::from_secs(60));

    assert_eq!(h.users.get_user(id).await.unwrap().id, id);
}

#[tokio::test]
async fn publish_failure_does_not_undo_the_write() {
    let h = Harness::new();
    let product = h.product("Dune", "books").await;
    h.bus.set_publish_failure(true);

    h.users.purchase_product(1, product).await.unwrap();
    let purchases = h.users.get_user_purchases(1, Page::default()).await.unwrap();
    assert_eq!(purchases.len(), 1);
}

#[tokio::test]
async fn registration_and_login() {
    let h = Harness::new();
    let user = h.identity.register("Ada", "ada@example.com", "s3cret").await.unwrap();
    assert!(
        h.bus
            .published_events("user_updates")
            .contains(&DomainEvent::UserCreated { user: user.clone() })
    );

    let token = h.identity.login("ada@example.com", "s3cret").await.unwrap();
    assert_eq!(h.identity.verify_token(&token), Ok(user.id));

    let duplicate = h.identity.register("Ada", "ada@example.com", "other").await;
    assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));

    let blank = h.identity.register("", "x@example.com", "pw").await;
    assert!(matches!(blank, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn unknown_email_and_wrong_password_fail_identically() {
    let h = Harness::new();
    h.identity.register("Ada", "ada@example.com", "s3cret").await.unwrap();

    let unknown = h.identity.login("nobody@example.com", "s3cret").await;
    let wrong = h.identity.login("ada@example.com", "guess").await;
    assert_eq!(unknown, Err(ServiceError::InvalidCredentials));
    assert_eq!(unknown, wrong);
    assert_eq!(
        unknown.unwrap_err().to_string(),
        wrong.unwrap_err().to_string()
    );
}

#[tokio::test]
async fn new_user_gets_an_empty_recommendation() {
    let h = Harness::new();
    h.product("Dune", "books").await;
    assert!(h.recommendations.get_latest_recommendation(99).await.unwrap().is_empty());
}

#[tokio::test]
async fn interactions_flow_into_scores_and_counters() {
    let h = Harness::new();
    let user = h.user("a@example.com").await;
    let older = h.product("Dune", "books").await;
    let _chess = h.product("Chess", "games").await;
    let newer = h.product("Emma", "books").await;

    // Cold read caches the empty ranking.
    assert!(h.recommendations.get_latest_recommendation(user).await.unwrap().is_empty());
    assert!(h.cache.contains(&keys::recommendations(user)));

    let shutdown = Shutdown::new();
    let (recommendation, analytics) = h.consumers();
    let recommendation_stats = recommendation.stats();
    let analytics_stats = analytics.stats();
    let mut handles = recommendation.spawn(&shutdown);
    handles.extend(analytics.spawn(&shutdown));

    h.users.like_product(user, older).await.unwrap();
    h.users.purchase_product(user, older).await.unwrap();

    // Catalogue events and user_created pass through both handlers untouched.
    assert!(
        helpers::eventually(Duration::from_secs(2), || {
            recommendation_stats.processed() == 6 && analytics_stats.processed() == 6
        })
        .await
    );

    assert_eq!(h.db.category_score(user, "books"), Some(7.0));
    assert_eq!(h.db.category_score(user, "games"), None);
    assert!(!h.cache.contains(&keys::recommendations(user)));
    assert_eq!(
        h.recommendations.get_latest_recommendation(user).await.unwrap(),
        vec![newer, older]
    );
    assert_eq!(
        h.cache.ttl(&keys::recommendations(user)),
        Some(Duration::from_secs(120))
    );

    let product_counters = h.analytics.get_product_analytics(older).await.unwrap();
    assert_eq!((product_counters.likes, product_counters.purchases), (1, 1));
    let user_counters = h.analytics.get_user_analytics(user).await.unwrap();
    assert_eq!(user_counters.total_likes, 1);
    assert_eq!(user_counters.total_purchases, 1);

    shutdown.trigger();
    let report = await_shutdown(handles, Duration::from_secs(1)).await;
    assert_eq!(report.stopped, 4);
}

#[tokio::test]
async fn interaction_on_unknown_product_is_skipped_and_consumer_continues() {
    let h = Harness::new();
    let product = h.product("Dune", "books").await;

    let shutdown = Shutdown::new();
    let (recommendation, _) = h.consumers();
    let stats = recommendation.stats();
    let handles = recommendation.spawn(&shutdown);

    recsys_core::event_bus::publish_event(
        h.bus.as_ref(),
        recsys_core::topic::Topic::UserUpdates,
        &helpers::liked(1, 404),
    )
    .await
    .unwrap();
    h.bus
        .publish("user_updates", None, br#"{"event":"user_liked","user_id":"one"}"#)
        .await
        .unwrap();
    h.users.like_product(1, product).await.unwrap();

    assert!(
        helpers::eventually(Duration::from_secs(2), || {
            stats.skipped() == 2 && stats.processed() == 2
        })
        .await
    );
    assert_eq!(h.db.category_score(1, "books"), Some(2.0));

    shutdown.trigger();
    await_shutdown(handles, Duration::from_secs(1)).await;
}

#[tokio::test]
async fn analytics_counter_failure_does_not_skip_the_other() {
    let h = Harness::new();
    h.db.fail_operation("increment_product", true);

    let result = h.analytics.record_interaction(Interaction::Dislike, 4, 9).await;
    assert!(matches!(result, Err(ServiceError::Infrastructure(_))));

    assert_eq!(h.analytics.get_user_analytics(4).await.unwrap().total_dislikes, 1);
    assert!(matches!(
        h.analytics.get_product_analytics(9).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn generate_snapshot_invalidates_and_announces() {
    let h = Harness::new();
    let product = h.product("Dune", "books").await;
    h.cache.seed(&keys::recommendations(5), "[1,2]", Duration::from_secs(60));

    let first = h.recommendations.generate_recommendations(5, product).await.unwrap();
    let second = h.recommendations.generate_recommendations(5, product).await.unwrap();
    assert_eq!(first.product_ids, vec![product]);
    assert!(!h.cache.contains(&keys::recommendations(5)));

    let history = h.recommendations.list_recommendations(5).await.unwrap();
    assert_eq!(history, vec![second, first.clone()]);
    assert_eq!(
        h.bus.published_events("recommendation_updates")[0],
        DomainEvent::RecommendationCreated { recommendation: first }
    );
}

#[tokio::test]
async fn product_lifecycle_is_announced() {
    let h = Harness::new();
    let id = h.product("Dune", "books").await;

    let updated = h
        .products
        .update_product(
            id,
            &ProductInput {
                name: "Dune Messiah".to_string(),
                description: "sequel".to_string(),
                price: 12.0,
                category: "books".to_string(),
            },
        )
        .await
        .unwrap();
    h.users.purchase_product(3, id).await.unwrap();
    assert_eq!(h.products.get_product(id).await.unwrap().purchase_count, 1);

    h.products.delete_product(id).await.unwrap();
    assert!(matches!(
        h.products.delete_product(id).await,
        Err(ServiceError::NotFound(_))
    ));

    let events = h.bus.published_events("product_updates");
    assert_eq!(events.len(), 3);
    assert_eq!(events[1], DomainEvent::ProductUpdated { product: updated });
    assert_eq!(events[2], DomainEvent::ProductDeleted { product_id: id });
}

#[tokio::test]
async fn invalid_product_input_is_rejected() {
    let h = Harness::new();
    let result = h
        .products
        .create_product(&ProductInput {
            name: "Dune".to_string(),
            description: String::new(),
            price: -1.0,
            category: "books".to_string(),
        })
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
    assert!(h.bus.published("product_updates").is_empty());
}
