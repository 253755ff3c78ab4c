//! Infrastructure setup shared by the service binaries.
//!
//! Each binary picks what it needs: every service has a database and a bus;
//! only the user and recommendation services talk to Redis.

use crate::config::{Config, Service};
use crate::error::StartupError;
use recsys_core::environment::SystemClock;
use recsys_core::event_bus::{EventBus, ensure_topics};
use recsys_core::topic::Topic;
use recsys_postgres::{PgPool, PoolSettings};
use recsys_redis::RedisCache;
use recsys_redpanda::RedpandaEventBus;
use recsys_services::TokenIssuer;
use std::sync::Arc;
use tracing::info;

/// Topics a service creates at startup.
#[must_use]
pub const fn owned_topics(service: Service) -> &'static [Topic] {
    match service {
        Service::Sso | Service::User => &[Topic::UserUpdates],
        Service::Product => &[Topic::ProductUpdates],
        Service::Recommendation => &[Topic::RecommendationUpdates],
        Service::Analytics => &[],
    }
}

/// Connect the pool and apply migrations.
///
/// # Errors
///
/// [`StartupError::Database`] if the database is unreachable or a migration fails.
pub async fn connect_database(config: &Config) -> Result<PgPool, StartupError> {
    info!("Connecting to database...");
    let settings = PoolSettings {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout: config.database.connect_timeout,
    };
    let pool = recsys_postgres::connect(&settings).await?;
    recsys_postgres::migrate(&pool).await?;
    Ok(pool)
}

/// Build the bus client and create the topics `config.service` owns.
///
/// # Errors
///
/// [`StartupError::EventBus`] if the client cannot be built or a topic cannot
/// be created. A topic that already exists is not an error.
pub async fn connect_bus(config: &Config) -> Result<Arc<RedpandaEventBus>, StartupError> {
    info!(brokers = %config.kafka.brokers, "Connecting to event bus...");
    let bus = RedpandaEventBus::builder()
        .brokers(&config.kafka.brokers)
        .producer_acks(&config.kafka.producer_acks)
        .auto_offset_reset(&config.kafka.auto_offset_reset)
        .build()?;

    let topics = owned_topics(config.service);
    ensure_topics(
        &bus as &dyn EventBus,
        topics,
        config.kafka.topic_partitions,
        config.kafka.topic_replication,
    )
    .await?;
    info!(topics = topics.len(), "Owned topics ready");

    Ok(Arc::new(bus))
}

/// Redis cache for the configured URL.
///
/// The connection is opened on first use, so an unreachable Redis does not
/// stop the service from booting; cache calls fail and are bypassed until it
/// comes back.
///
/// # Errors
///
/// [`StartupError::Cache`] if `REDIS_URL` is not a valid Redis URL.
pub fn connect_cache(config: &Config) -> Result<Arc<RedisCache>, StartupError> {
    let cache = RedisCache::new(&config.redis_url)?;
    info!("Cache configured; connecting on first use");
    Ok(Arc::new(cache))
}

/// Token issuer over the configured secret and the system clock.
///
/// # Errors
///
/// [`StartupError::Tokens`] if the secret is empty.
pub fn token_issuer(config: &Config) -> Result<TokenIssuer, StartupError> {
    Ok(TokenIssuer::new(
        config.auth.jwt_secret.as_bytes(),
        config.auth.token_ttl,
        Arc::new(SystemClock),
    )?)
}
