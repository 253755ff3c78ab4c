//! Interaction counters.

use crate::error::{Result, ServiceError};
use recsys_core::model::{Interaction, ProductAnalytics, ProductId, UserAnalytics, UserId};
use recsys_core::ports::AnalyticsRepository;
use std::sync::Arc;
use tracing::{debug, error};

/// Analytics service.
#[derive(Clone)]
pub struct AnalyticsService {
    analytics: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub fn new(analytics: Arc<dyn AnalyticsRepository>) -> Self {
        Self { analytics }
    }

    /// Increment the product-side and the user-side counter.
    ///
    /// Both increments are attempted even if the first one fails.
    ///
    /// # Errors
    ///
    /// Returns the first failure after both attempts.
    pub async fn record_interaction(
        &self,
        interaction: Interaction,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<()> {
        let product = self.analytics.increment_product(product_id, interaction).await;
        if let Err(e) = &product {
            error!(product_id, ?interaction, error = %e, "Failed to increment product counter");
        }

        let user = self.analytics.increment_user(user_id, interaction).await;
        if let Err(e) = &user {
            error!(user_id, ?interaction, error = %e, "Failed to increment user counter");
        }

        debug!(user_id, product_id, ?interaction, "Interaction recorded");
        product.and(user).map_err(ServiceError::from)
    }

    /// Counters of a product.
    ///
    /// # Errors
    ///
    /// `NotFound` before the first interaction, `Infrastructure` on failure.
    pub async fn get_product_analytics(&self, product_id: ProductId) -> Result<ProductAnalytics> {
        Ok(self.analytics.product_analytics(product_id).await?)
    }

    /// Counters of a user.
    ///
    /// # Errors
    ///
    /// `NotFound` before the first interaction, `Infrastructure` on failure.
    pub async fn get_user_analytics(&self, user_id: UserId) -> Result<UserAnalytics> {
        Ok(self.analytics.user_analytics(user_id).await?)
    }
}
