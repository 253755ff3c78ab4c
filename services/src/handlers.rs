//! Event handlers for the two consumer groups.
//!
//! Both groups subscribe to `user_updates` and `product_updates` and act only
//! on interactions; every other kind is accepted and dropped.

use crate::analytics::AnalyticsService;
use crate::recommendation::RecommendationService;
use async_trait::async_trait;
use recsys_core::event::DomainEvent;
use recsys_runtime::{EventHandler, HandlerError};
use tracing::debug;

/// `recommendation_service_group`: interactions move category scores.
pub struct RecommendationEventHandler {
    service: RecommendationService,
}

impl RecommendationEventHandler {
    /// Create a handler over `service`.
    #[must_use]
    pub const fn new(service: RecommendationService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for RecommendationEventHandler {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let Some((interaction, user_id, product_id)) = event.interaction() else {
            debug!(kind = event.kind(), "Event not relevant for recommendations");
            return Ok(());
        };
        self.service
            .apply_interaction(interaction, user_id, product_id)
            .await?;
        Ok(())
    }
}

/// `analytics_service_group`: interactions bump counters.
pub struct AnalyticsEventHandler {
    service: AnalyticsService,
}

impl AnalyticsEventHandler {
    /// Create a handler over `service`.
    #[must_use]
    pub const fn new(service: AnalyticsService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for AnalyticsEventHandler {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let Some((interaction, user_id, product_id)) = event.interaction() else {
            debug!(kind = event.kind(), "Event not relevant for analytics");
            return Ok(());
        };
        self.service
            .record_interaction(interaction, user_id, product_id)
            .await?;
        Ok(())
    }
}
