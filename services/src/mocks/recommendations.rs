use super::InMemoryDatabase;
use async_trait::async_trait;
use recsys_core::error::{RepositoryError, RepositoryResult};
use recsys_core::model::{ProductId, Recommendation, UserId};
use recsys_core::ports::RecommendationRepository;
use std::cmp::Ordering;

const TOP_CATEGORIES: usize = 10;

#[async_trait]
impl RecommendationRepository for InMemoryDatabase {
    async fn product_category(&self, product_id: ProductId) -> RepositoryResult<String> {
        self.tables("product_category")?
            .products
            .get(&product_id)
            .map(|product| product.category.clone())
            .ok_or_else(|| RepositoryError::not_found("Product", product_id))
    }

    async fn add_category_score(
        &self,
        user_id: UserId,
        category: &str,
        delta: f64,
    ) -> RepositoryResult<()> {
        *self
            .tables("add_category_score")?
            .scores
            .entry((user_id, category.to_string()))
            .or_insert(0.0) += delta;
        Ok(())
    }

    async fn top_products_by_preference(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> RepositoryResult<Vec<ProductId>> {
        let tables = self.tables("top_products_by_preference")?;

        let mut scored: Vec<(&str, f64)> = tables
            .scores
            .iter()
            .filter(|((uid, _), _)| *uid == user_id)
            .map(|((_, category), score)| (category.as_str(), *score))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        let top: Vec<&str> = scored
            .into_iter()
            .take(TOP_CATEGORIES)
            .map(|(category, _)| category)
            .collect();

        let mut products: Vec<_> = tables
            .products
            .values()
            .filter(|product| top.contains(&product.category.as_str()))
            .collect();
        products.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        Ok(products
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|product| product.id)
            .collect())
    }

    async fn create_recommendation(
        &self,
        user_id: UserId,
        product_ids: &[ProductId],
    ) -> RepositoryResult<Recommendation> {
        let mut tables = self.tables("create_recommendation")?;
        let recommendation = Recommendation {
            id: tables.next_id(),
            user_id,
            product_ids: product_ids.to_vec(),
            created_at: tables.now(),
        };
        tables.recommendations.push(recommendation.clone());
        Ok(recommendation)
    }

    async fn recommendations_for_user(
        &self,
        user_id: UserId,
    ) -> RepositoryResult<Vec<Recommendation>> {
        Ok(self
            .tables("recommendations_for_user")?
            .recommendations
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}
