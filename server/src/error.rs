//! Startup failures. Each one ends the process with a non-zero status.

use crate::config::ConfigError;
use recsys_core::cache::CacheError;
use recsys_core::event_bus::EventBusError;
use recsys_postgres::PostgresError;
use recsys_runtime::metrics::MetricsError;
use recsys_services::ServiceError;
use thiserror::Error;

/// Why a service could not start (or stopped serving).
#[derive(Error, Debug)]
pub enum StartupError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database unreachable or migrations failed
    #[error(transparent)]
    Database(#[from] PostgresError),

    /// Broker unreachable or topic creation failed
    #[error(transparent)]
    EventBus(#[from] EventBusError),

    /// Redis unreachable
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Token issuer could not be built
    #[error("Token issuer: {0}")]
    Tokens(#[from] ServiceError),

    /// Metrics recorder could not be installed
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// Listener could not bind, or the HTTP server failed
    #[error("HTTP server: {0}")]
    Io(#[from] std::io::Error),
}
