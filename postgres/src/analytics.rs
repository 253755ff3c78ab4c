//! Interaction counters.
//!
//! Every increment is one `INSERT ... ON CONFLICT DO UPDATE` statement, so the
//! row is created on first use and concurrent increments never lose updates.

use crate::storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recsys_core::error::{RepositoryError, RepositoryResult};
use recsys_core::model::{Interaction, ProductAnalytics, ProductId, UserAnalytics, UserId};
use recsys_core::ports::AnalyticsRepository;
use sqlx::PgPool;

const fn product_increment_sql(interaction: Interaction) -> &'static str {
    match interaction {
        Interaction::Like => {
            r"
            INSERT INTO product_analytics (product_id, likes, updated_at) VALUES ($1, 1, NOW())
            ON CONFLICT (product_id)
            DO UPDATE SET likes = product_analytics.likes + 1, updated_at = NOW()
            "
        },
        Interaction::Dislike => {
            r"
            INSERT INTO product_analytics (product_id, dislikes, updated_at) VALUES ($1, 1, NOW())
            ON CONFLICT (product_id)
            DO UPDATE SET dislikes = product_analytics.dislikes + 1, updated_at = NOW()
            "
        },
        Interaction::Purchase => {
            r"
            INSERT INTO product_analytics (product_id, purchases, updated_at) VALUES ($1, 1, NOW())
            ON CONFLICT (product_id)
            DO UPDATE SET purchases = product_analytics.purchases + 1, updated_at = NOW()
            "
        },
    }
}

const fn user_increment_sql(interaction: Interaction) -> &'static str {
    match interaction {
        Interaction::Like => {
            r"
            INSERT INTO user_analytics (user_id, total_likes, updated_at) VALUES ($1, 1, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET total_likes = user_analytics.total_likes + 1, updated_at = NOW()
            "
        },
        Interaction::Dislike => {
            r"
            INSERT INTO user_analytics (user_id, total_dislikes, updated_at) VALUES ($1, 1, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET total_dislikes = user_analytics.total_dislikes + 1, updated_at = NOW()
            "
        },
        Interaction::Purchase => {
            r"
            INSERT INTO user_analytics (user_id, total_purchases, updated_at) VALUES ($1, 1, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET total_purchases = user_analytics.total_purchases + 1, updated_at = NOW()
            "
        },
    }
}

/// PostgreSQL analytics repository.
#[derive(Clone)]
pub struct PostgresAnalyticsRepository {
    pool: PgPool,
}

impl PostgresAnalyticsRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for PostgresAnalyticsRepository {
    async fn increment_product(
        &self,
        product_id: ProductId,
        interaction: Interaction,
    ) -> RepositoryResult<()> {
        sqlx::query(product_increment_sql(interaction))
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(storage("increment product counter"))?;
        Ok(())
    }

    async fn increment_user(
        &self,
        user_id: UserId,
        interaction: Interaction,
    ) -> RepositoryResult<()> {
        sqlx::query(user_increment_sql(interaction))
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(storage("increment user counter"))?;
        Ok(())
    }

    async fn product_analytics(&self, product_id: ProductId) -> RepositoryResult<ProductAnalytics> {
        let row: Option<(i64, i64, i64, i64, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT product_id, likes, dislikes, purchases, updated_at
            FROM product_analytics
            WHERE product_id = $1
            ",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("get product analytics"))?;

        let (product_id, likes, dislikes, purchases, updated_at) =
            row.ok_or_else(|| RepositoryError::not_found("ProductAnalytics", product_id))?;

        Ok(ProductAnalytics {
            product_id,
            likes,
            dislikes,
            purchases,
            updated_at,
        })
    }

    async fn user_analytics(&self, user_id: UserId) -> RepositoryResult<UserAnalytics> {
        let row: Option<(i64, i64, i64, i64, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT user_id, total_likes, total_dislikes, total_purchases, updated_at
            FROM user_analytics
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("get user analytics"))?;

        let (user_id, total_likes, total_dislikes, total_purchases, updated_at) =
            row.ok_or_else(|| RepositoryError::not_found("UserAnalytics", user_id))?;

        Ok(UserAnalytics {
            user_id,
            total_likes,
            total_dislikes,
            total_purchases,
            updated_at,
        })
    }
}
