//! # Recsys Server
//!
//! Process-level wiring for the five services: configuration from the
//! environment, tracing setup, infrastructure bootstrap, and the serve /
//! shutdown lifecycle. Each binary under `src/bin` composes these with its
//! own domain service.
//!
//! ```text
//! sso-service             :8084  /api/auth/*
//! user-service            :8080  /api/users/*
//! product-service         :8081  /api/products/*
//! recommendation-service  :8082  /api/recommendations/*   + consumer group
//! analytics-service       :8083  /api/analytics/*         + consumer group
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod telemetry;

pub use config::{Config, ConfigError, Service};
pub use error::StartupError;

/// Load the configuration for `service` and initialize tracing.
///
/// Configuration is read first so `RUST_LOG` and `LOG_FORMAT` from `.env`
/// apply to the subscriber. A configuration error is logged before it is
/// returned.
///
/// # Errors
///
/// Returns [`StartupError::Config`] if the environment is invalid.
pub fn init(service: Service) -> Result<Config, StartupError> {
    let config = Config::from_env(service);
    telemetry::init(service);

    match config {
        Ok(config) => {
            tracing::info!(service = service.name(), "Starting");
            Ok(config)
        }
        Err(e) => {
            tracing::error!(service = service.name(), error = %e, "Invalid configuration");
            Err(e.into())
        }
    }
}

/// Log a fatal error and hand it back for `main` to return.
pub fn fatal(service: Service, error: StartupError) -> Box<dyn std::error::Error> {
    tracing::error!(service = service.name(), error = %error, "Service failed");
    error.into()
}
