//! `PostgreSQL` repositories for the recommendation platform.
//!
//! One repository per domain, each implementing its port from
//! `recsys_core::ports` over a shared [`PgPool`]:
//!
//! - [`PostgresUserRepository`]: users, likes/dislikes, purchases
//! - [`PostgresProductRepository`]: catalogue
//! - [`PostgresRecommendationRepository`]: category scores, ranking, snapshots
//! - [`PostgresAnalyticsRepository`]: interaction counters
//! - [`PostgresIdentityRepository`]: credentials
//!
//! Aggregate mutators rely on the store's own atomic primitives
//! (`INSERT ... ON CONFLICT ... DO UPDATE`, transactions); no application
//! level locking is involved.
//!
//! # Example
//!
//! ```ignore
//! use recsys_postgres::{connect, migrate, PoolSettings, PostgresUserRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = connect(&PoolSettings::new("postgres://localhost/recsys")).await?;
//!     migrate(&pool).await?;
//!     let users = PostgresUserRepository::new(pool);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analytics;
mod identity;
mod products;
mod recommendations;
mod users;

pub use analytics::PostgresAnalyticsRepository;
pub use identity::PostgresIdentityRepository;
pub use products::PostgresProductRepository;
pub use recommendations::PostgresRecommendationRepository;
pub use users::PostgresUserRepository;

use recsys_core::error::RepositoryError;
pub use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use thiserror::Error;

/// Errors from pool setup and migrations.
#[derive(Error, Debug)]
pub enum PostgresError {
    /// Could not connect.
    #[error("Failed to connect to database: {0}")]
    Connect(String),

    /// Migrations failed.
    #[error("Migration failed: {0}")]
    Migrate(String),
}

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Connection URL
    pub url: String,
    /// Maximum pool size
    pub max_connections: u32,
    /// Minimum idle connections
    pub min_connections: u32,
    /// Acquire timeout
    pub connect_timeout: Duration,
}

impl PoolSettings {
    /// Defaults: 10 max, 2 min, 30s acquire timeout.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns [`PostgresError::Connect`] if the database is unreachable.
pub async fn connect(settings: &PoolSettings) -> Result<PgPool, PostgresError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.connect_timeout)
        .connect(&settings.url)
        .await
        .map_err(|e| PostgresError::Connect(e.to_string()))?;

    tracing::info!(
        max_connections = settings.max_connections,
        min_connections = settings.min_connections,
        "Database pool ready"
    );
    Ok(pool)
}

/// Apply the embedded migrations.
///
/// # Errors
///
/// Returns [`PostgresError::Migrate`] if any migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), PostgresError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| PostgresError::Migrate(e.to_string()))?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Map a driver error to [`RepositoryError::Storage`] with operation context.
fn storage(operation: &'static str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |e| {
        tracing::error!(operation, error = %e, "Database operation failed");
        RepositoryError::storage(operation, e)
    }
}

/// Like [`storage`], but unique violations become [`RepositoryError::Conflict`].
fn storage_or_conflict(
    operation: &'static str,
    conflict: &'static str,
) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return RepositoryError::Conflict(conflict.to_string());
            }
        }
        storage(operation)(e)
    }
}
