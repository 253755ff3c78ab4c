//! Recommendation engine.
//!
//! Preference state is a per-(user, category) score moved only by additive
//! deltas from interaction events. The latest recommendation is not stored:
//! it is the preference ranking, cached under `recommendations:user:<id>`
//! until the next score change or snapshot for that user deletes the entry.

use crate::config::{CacheConfig, ScoringConfig};
use crate::effects;
use crate::error::Result;
use recsys_core::cache::{Cache, keys};
use recsys_core::event::DomainEvent;
use recsys_core::event_bus::EventBus;
use recsys_core::model::{Interaction, ProductId, Recommendation, UserId};
use recsys_core::ports::RecommendationRepository;
use recsys_core::topic::Topic;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const CACHE_FAMILY: &str = "recommendations";

/// Recommendation service.
#[derive(Clone)]
pub struct RecommendationService {
    recommendations: Arc<dyn RecommendationRepository>,
    cache: Arc<dyn Cache>,
    event_bus: Arc<dyn EventBus>,
    scoring: ScoringConfig,
    cache_config: CacheConfig,
}

impl RecommendationService {
    /// Create a new recommendation service.
    #[must_use]
    pub fn new(
        recommendations: Arc<dyn RecommendationRepository>,
        cache: Arc<dyn Cache>,
        event_bus: Arc<dyn EventBus>,
        scoring: ScoringConfig,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            recommendations,
            cache,
            event_bus,
            scoring,
            cache_config,
        }
    }

    /// Products for the user's top categories, newest first.
    ///
    /// Served from the cache when possible; a miss, an undecodable entry or a
    /// cache failure falls through to the ranking query, whose result is cached.
    /// A user with no scores gets an empty list.
    ///
    /// # Errors
    ///
    /// `Infrastructure` if the ranking query fails.
    #[instrument(skip(self))]
    pub async fn get_latest_recommendation(&self, user_id: UserId) -> Result<Vec<ProductId>> {
        let key = keys::recommendations(user_id);
        if let Some(product_ids) = effects::cached(self.cache.as_ref(), CACHE_FAMILY, &key).await {
            return Ok(product_ids);
        }

        let product_ids = self
            .recommendations
            .top_products_by_preference(user_id, self.scoring.recommendation_limit)
            .await?;
        effects::fill(
            self.cache.as_ref(),
            &key,
            &product_ids,
            self.cache_config.recommendation_ttl,
        )
        .await;
        Ok(product_ids)
    }

    /// Record a snapshot recommending `product_id`, drop the cached ranking,
    /// publish `recommendation_created`.
    ///
    /// # Errors
    ///
    /// `Infrastructure` if the snapshot cannot be stored.
    #[instrument(skip(self))]
    pub async fn generate_recommendations(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Recommendation> {
        let recommendation = self
            .recommendations
            .create_recommendation(user_id, &[product_id])
            .await?;
        effects::invalidate(self.cache.as_ref(), &keys::recommendations(user_id)).await;
        effects::publish(
            self.event_bus.as_ref(),
            Topic::RecommendationUpdates,
            &DomainEvent::RecommendationCreated {
                recommendation: recommendation.clone(),
            },
        )
        .await;
        info!(recommendation_id = recommendation.id, "Recommendation generated");
        Ok(recommendation)
    }

    /// Snapshot history of a user, newest first.
    ///
    /// # Errors
    ///
    /// `Infrastructure` if the store fails.
    pub async fn list_recommendations(&self, user_id: UserId) -> Result<Vec<Recommendation>> {
        Ok(self.recommendations.recommendations_for_user(user_id).await?)
    }

    /// Move the score of the product's category by the interaction's delta
    /// and drop the user's cached ranking.
    ///
    /// # Errors
    ///
    /// `NotFound` if the product is unknown (e.g. its `product_created` has
    /// not been applied yet), `Infrastructure` if the store fails. No score
    /// changes in either case.
    #[instrument(skip(self))]
    pub async fn apply_interaction(
        &self,
        interaction: Interaction,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<()> {
        let category = self.recommendations.product_category(product_id).await?;
        let delta = self.scoring.delta(interaction);
        self.recommendations
            .add_category_score(user_id, &category, delta)
            .await?;
        effects::invalidate(self.cache.as_ref(), &keys::recommendations(user_id)).await;
        debug!(category = %category, delta, "Preference score applied");
        Ok(())
    }
}
