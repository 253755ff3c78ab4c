//! Analytics service.
//!
//! Runs `analytics_service_group` over `user_updates` and `product_updates`
//! and serves the resulting counters.

use recsys_core::event_bus::EventBus;
use recsys_core::topic::{ANALYTICS_GROUP, INTERACTION_TOPICS};
use recsys_postgres::PostgresAnalyticsRepository;
use recsys_runtime::{EventHandler, TopicConsumer};
use recsys_server::{Config, Service, StartupError, bootstrap, lifecycle};
use recsys_services::{AnalyticsEventHandler, AnalyticsService};
use recsys_web::handlers::analytics;
use std::sync::Arc;

const SERVICE: Service = Service::Analytics;

async fn run(config: &Config) -> Result<(), StartupError> {
    let pool = bootstrap::connect_database(config).await?;
    let bus = bootstrap::connect_bus(config).await?;
    let tokens = Arc::new(bootstrap::token_issuer(config)?);

    let service = AnalyticsService::new(Arc::new(PostgresAnalyticsRepository::new(pool)));

    let consumer = TopicConsumer::new(
        SERVICE.name(),
        ANALYTICS_GROUP,
        &INTERACTION_TOPICS,
        bus as Arc<dyn EventBus>,
        Arc::new(AnalyticsEventHandler::new(service.clone())) as Arc<dyn EventHandler>,
    );

    lifecycle::serve(config, analytics::router(service, tokens), vec![consumer]).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = recsys_server::init(SERVICE)?;
    run(&config)
        .await
        .map_err(|e| recsys_server::fatal(SERVICE, e))
}
