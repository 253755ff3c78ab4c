use super::InMemoryDatabase;
use async_trait::async_trait;
use recsys_core::error::{RepositoryError, RepositoryResult};
use recsys_core::model::{Interaction, ProductAnalytics, ProductId, UserAnalytics, UserId};
use recsys_core::ports::AnalyticsRepository;

#[async_trait]
impl AnalyticsRepository for InMemoryDatabase {
    async fn increment_product(
        &self,
        product_id: ProductId,
        interaction: Interaction,
    ) -> RepositoryResult<()> {
        let mut tables = self.tables("increment_product")?;
        let now = tables.now();
        let row = tables
            .product_analytics
            .entry(product_id)
            .or_insert_with(|| ProductAnalytics {
                product_id,
                likes: 0,
                dislikes: 0,
                purchases: 0,
                updated_at: now,
            });
        match interaction {
            Interaction::Like => row.likes += 1,
            Interaction::Dislike => row.dislikes += 1,
            Interaction::Purchase => row.purchases += 1,
        }
        row.updated_at = now;
        Ok(())
    }

    async fn increment_user(
        &self,
        user_id: UserId,
        interaction: Interaction,
    ) -> RepositoryResult<()> {
        let mut tables = self.tables("increment_user")?;
        let now = tables.now();
        let row = tables
            .user_analytics
            .entry(user_id)
            .or_insert_with(|| UserAnalytics {
                user_id,
                total_likes: 0,
                total_dislikes: 0,
                total_purchases: 0,
                updated_at: now,
            });
        match interaction {
            Interaction::Like => row.total_likes += 1,
            Interaction::Dislike => row.total_dislikes += 1,
            Interaction::Purchase => row.total_purchases += 1,
        }
        row.updated_at = now;
        Ok(())
    }

    async fn product_analytics(&self, product_id: ProductId) -> RepositoryResult<ProductAnalytics> {
        self.tables("product_analytics")?
            .product_analytics
            .get(&product_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("ProductAnalytics", product_id))
    }

    async fn user_analytics(&self, user_id: UserId) -> RepositoryResult<UserAnalytics> {
        self.tables("user_analytics")?
            .user_analytics
            .get(&user_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("UserAnalytics", user_id))
    }
}
