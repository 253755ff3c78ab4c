//! Tracing subscriber setup.
//!
//! `RUST_LOG` overrides the default filter
//! `"<service>=info,recsys=info,tower_http=debug"`. `LOG_FORMAT=json` switches
//! from human-readable lines to one JSON object per event.

use crate::config::Service;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable
    Pretty,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Parse `LOG_FORMAT`; anything but `json` is [`LogFormat::Pretty`].
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Default filter directives for `service`.
#[must_use]
pub fn default_filter(service: Service) -> String {
    format!(
        "{}=info,recsys=info,tower_http=debug,sqlx=warn",
        service.name()
    )
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(service: Service) {
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(service).into());
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    if result.is_ok() {
        tracing::debug!(service = service.name(), ?format, "Tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("text")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
    }

    #[test]
    fn filter_names_the_service() {
        assert!(default_filter(Service::Analytics).starts_with("analytics_service=info"));
    }
}
