//! Category scores, preference ranking, and recommendation snapshots.

use crate::storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recsys_core::error::{RepositoryError, RepositoryResult};
use recsys_core::model::{ProductId, Recommendation, UserId};
use recsys_core::ports::RecommendationRepository;
use sqlx::PgPool;

/// How many of the user's best categories feed the ranking.
const TOP_CATEGORIES: i64 = 10;

#[derive(sqlx::FromRow)]
struct RecommendationRow {
    id: i64,
    user_id: i64,
    product_ids: Vec<i64>,
    created_at: DateTime<Utc>,
}

impl From<RecommendationRow> for Recommendation {
    fn from(row: RecommendationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_ids: row.product_ids,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL recommendation repository.
#[derive(Clone)]
pub struct PostgresRecommendationRepository {
    pool: PgPool,
}

impl PostgresRecommendationRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecommendationRepository for PostgresRecommendationRepository {
    async fn product_category(&self, product_id: ProductId) -> RepositoryResult<String> {
        sqlx::query_scalar::<_, String>("SELECT category FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage("get product category"))?
            .ok_or_else(|| RepositoryError::not_found("Product", product_id))
    }

    async fn add_category_score(
        &self,
        user_id: UserId,
        category: &str,
        delta: f64,
    ) -> RepositoryResult<()> {
        sqlx::query(
            r"
            INSERT INTO user_category_preferences (user_id, category, score, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, category)
            DO UPDATE SET score = user_category_preferences.score + EXCLUDED.score,
                          updated_at = NOW()
            ",
        )
        .bind(user_id)
        .bind(category)
        .bind(delta)
        .execute(&self.pool)
        .await
        .map_err(storage("update category score"))?;

        tracing::debug!(user_id, category, delta, "Category score updated");
        Ok(())
    }

    async fn top_products_by_preference(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> RepositoryResult<Vec<ProductId>> {
        sqlx::query_scalar::<_, i64>(
            r"
            SELECT p.id
            FROM products p
            WHERE p.category IN (
                SELECT category
                FROM user_category_preferences
                WHERE user_id = $1
                ORDER BY score DESC
                LIMIT $2
            )
            ORDER BY p.updated_at DESC, p.id DESC
            LIMIT $3
            ",
        )
        .bind(user_id)
        .bind(TOP_CATEGORIES)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("rank products by preference"))
    }

    async fn create_recommendation(
        &self,
        user_id: UserId,
        product_ids: &[ProductId],
    ) -> RepositoryResult<Recommendation> {
        sqlx::query_as::<_, RecommendationRow>(
            r"
            INSERT INTO recommendations (user_id, product_ids)
            VALUES ($1, $2)
            RETURNING id, user_id, product_ids, created_at
            ",
        )
        .bind(user_id)
        .bind(product_ids)
        .fetch_one(&self.pool)
        .await
        .map(Recommendation::from)
        .map_err(storage("create recommendation"))
    }

    async fn recommendations_for_user(
        &self,
        user_id: UserId,
    ) -> RepositoryResult<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, RecommendationRow>(
            r"
            SELECT id, user_id, product_ids, created_at
            FROM recommendations
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list recommendations"))?;

        Ok(rows.into_iter().map(Recommendation::from).collect())
    }
}
