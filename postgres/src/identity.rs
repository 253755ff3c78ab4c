//! Credentials store.

use crate::{storage, storage_or_conflict};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recsys_core::error::RepositoryResult;
use recsys_core::model::{Identity, NewIdentity};
use recsys_core::ports::IdentityRepository;
use sqlx::PgPool;

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL identity repository.
#[derive(Clone)]
pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn create_identity(&self, identity: &NewIdentity) -> RepositoryResult<Identity> {
        sqlx::query_as::<_, IdentityRow>(
            r"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at, updated_at
            ",
        )
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .fetch_one(&self.pool)
        .await
        .map(Identity::from)
        .map_err(storage_or_conflict("create identity", "email already registered"))
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Identity>> {
        sqlx::query_as::<_, IdentityRow>(
            r"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(Identity::from))
        .map_err(storage("find identity by email"))
    }
}
