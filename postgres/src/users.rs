//! Users, likes/dislikes and purchases.

use crate::{storage, storage_or_conflict};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recsys_core::error::{RepositoryError, RepositoryResult};
use recsys_core::model::{
    Dislike, Like, Page, ProductId, Purchase, User, UserActions, UserId, UserUpdate,
};
use recsys_core::ports::UserRepository;
use sqlx::{PgPool, Postgres, Transaction};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Rows of `likes`, `dislikes` and `purchases` share one shape.
#[derive(sqlx::FromRow)]
pub(crate) struct InteractionRow {
    pub(crate) id: i64,
    pub(crate) user_id: i64,
    pub(crate) product_id: i64,
    pub(crate) at: DateTime<Utc>,
}

impl From<InteractionRow> for Like {
    fn from(row: InteractionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            liked_at: row.at,
        }
    }
}

impl From<InteractionRow> for Dislike {
    fn from(row: InteractionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            disliked_at: row.at,
        }
    }
}

impl From<InteractionRow> for Purchase {
    fn from(row: InteractionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            purchased_at: row.at,
        }
    }
}

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

/// Transaction-scoped lock keyed by the (user, product) pair.
const REACTION_LOCK_SQL: &str =
    "SELECT pg_advisory_xact_lock(hashtextextended($1::text || ':' || $2::text, 0))";

impl PostgresUserRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retract the opposite reaction, then insert `table`'s row unless it
    /// already exists, all in one transaction.
    ///
    /// The transaction first takes an advisory lock on the (user, product)
    /// pair, so a concurrent like and dislike of the same pair run one after
    /// the other and never both commit a row.
    ///
    /// `retract_sql` and `insert_sql` are fixed statements chosen by the caller.
    async fn react(
        &self,
        user_id: UserId,
        product_id: ProductId,
        retract_sql: &'static str,
        insert_sql: &'static str,
        operation: &'static str,
        conflict: String,
    ) -> RepositoryResult<InteractionRow> {
        let mut tx: Transaction<'_, Postgres> =
            self.pool.begin().await.map_err(storage(operation))?;

        sqlx::query(REACTION_LOCK_SQL)
            .bind(user_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(storage(operation))?;

        sqlx::query(retract_sql)
            .bind(user_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(storage(operation))?;

        let inserted = sqlx::query_as::<_, InteractionRow>(insert_sql)
            .bind(user_id)
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage(operation))?;

        if let Some(row) = inserted {
            tx.commit().await.map_err(storage(operation))?;
            Ok(row)
        } else {
            tx.rollback().await.map_err(storage(operation))?;
            Err(RepositoryError::Conflict(conflict))
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_user(&self, id: UserId) -> RepositoryResult<User> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("get user"))?
        .map(User::from)
        .ok_or_else(|| RepositoryError::not_found("User", id))
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> RepositoryResult<User> {
        sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET name = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_or_conflict("update user", "email already in use"))?
        .map(User::from)
        .ok_or_else(|| RepositoryError::not_found("User", id))
    }

    async fn list_users(&self, page: Page) -> RepositoryResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, created_at, updated_at
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list users"))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn like_product(&self, user_id: UserId, product_id: ProductId) -> RepositoryResult<Like> {
        self.react(
            user_id,
            product_id,
            "DELETE FROM dislikes WHERE user_id = $1 AND product_id = $2",
            r"
            INSERT INTO likes (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            RETURNING id, user_id, product_id, liked_at AS at
            ",
            "like product",
            format!("like already exists for user {user_id} and product {product_id}"),
        )
        .await
        .map(Like::from)
    }

    async fn dislike_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> RepositoryResult<Dislike> {
        self.react(
            user_id,
            product_id,
            "DELETE FROM likes WHERE user_id = $1 AND product_id = $2",
            r"
            INSERT INTO dislikes (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            RETURNING id, user_id, product_id, disliked_at AS at
            ",
            "dislike product",
            format!("dislike already exists for user {user_id} and product {product_id}"),
        )
        .await
        .map(Dislike::from)
    }

    async fn create_purchase(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> RepositoryResult<Purchase> {
        sqlx::query_as::<_, InteractionRow>(
            r"
            INSERT INTO purchases (user_id, product_id)
            VALUES ($1, $2)
            RETURNING id, user_id, product_id, purchased_at AS at
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await
        .map(Purchase::from)
        .map_err(storage("create purchase"))
    }

    async fn user_actions(
        &self,
        user_id: UserId,
        product_id: Option<ProductId>,
    ) -> RepositoryResult<UserActions> {
        let likes = sqlx::query_as::<_, InteractionRow>(
            r"
            SELECT id, user_id, product_id, liked_at AS at
            FROM likes
            WHERE user_id = $1 AND ($2::BIGINT IS NULL OR product_id = $2)
            ORDER BY liked_at DESC
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list likes"))?;

        let dislikes = sqlx::query_as::<_, InteractionRow>(
            r"
            SELECT id, user_id, product_id, disliked_at AS at
            FROM dislikes
            WHERE user_id = $1 AND ($2::BIGINT IS NULL OR product_id = $2)
            ORDER BY disliked_at DESC
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list dislikes"))?;

        let purchases = sqlx::query_as::<_, InteractionRow>(
            r"
            SELECT id, user_id, product_id, purchased_at AS at
            FROM purchases
            WHERE user_id = $1 AND ($2::BIGINT IS NULL OR product_id = $2)
            ORDER BY purchased_at DESC
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list purchases"))?;

        Ok(UserActions {
            likes: likes.into_iter().map(Like::from).collect(),
            dislikes: dislikes.into_iter().map(Dislike::from).collect(),
            purchases: purchases.into_iter().map(Purchase::from).collect(),
        })
    }

    async fn purchases(&self, user_id: UserId, page: Page) -> RepositoryResult<Vec<Purchase>> {
        let rows = sqlx::query_as::<_, InteractionRow>(
            r"
            SELECT id, user_id, product_id, purchased_at AS at
            FROM purchases
            WHERE user_id = $1
            ORDER BY purchased_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list purchases"))?;

        Ok(rows.into_iter().map(Purchase::from).collect())
    }
}
