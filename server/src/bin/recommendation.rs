//! Recommendation service.
//!
//! Serves recommendations over HTTP and runs `recommendation_service_group`
//! over `user_updates` and `product_updates`, turning interactions into
//! category score changes.

use recsys_core::event_bus::EventBus;
use recsys_core::topic::{INTERACTION_TOPICS, RECOMMENDATION_GROUP};
use recsys_postgres::PostgresRecommendationRepository;
use recsys_runtime::{EventHandler, TopicConsumer};
use recsys_server::{Config, Service, StartupError, bootstrap, lifecycle};
use recsys_services::{RecommendationEventHandler, RecommendationService};
use recsys_web::handlers::recommendations;
use std::sync::Arc;

const SERVICE: Service = Service::Recommendation;

async fn run(config: &Config) -> Result<(), StartupError> {
    let pool = bootstrap::connect_database(config).await?;
    let bus = bootstrap::connect_bus(config).await?;
    let cache = bootstrap::connect_cache(config)?;
    let tokens = Arc::new(bootstrap::token_issuer(config)?);

    let service = RecommendationService::new(
        Arc::new(PostgresRecommendationRepository::new(pool)),
        cache,
        bus.clone(),
        config.scoring,
        config.cache,
    );

    let consumer = TopicConsumer::new(
        SERVICE.name(),
        RECOMMENDATION_GROUP,
        &INTERACTION_TOPICS,
        bus as Arc<dyn EventBus>,
        Arc::new(RecommendationEventHandler::new(service.clone())) as Arc<dyn EventHandler>,
    );

    lifecycle::serve(
        config,
        recommendations::router(service, tokens),
        vec![consumer],
    )
    .await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = recsys_server::init(SERVICE)?;
    run(&config)
        .await
        .map_err(|e| recsys_server::fatal(SERVICE, e))
}
