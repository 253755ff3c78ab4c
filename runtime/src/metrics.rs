//! Prometheus metrics for the platform services.
//!
//! This module installs the global `metrics` recorder and names every counter
//! the services emit:
//! - Consumer messages (processed, skipped, ignored) per consumer and topic
//! - Event publish failures per topic
//! - Cache hits, misses and errors per key family
//!
//! # Example
//!
//! ```rust,no_run
//! use recsys_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // The binaries serve `server.render()` at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder plus the address its scrape endpoint is served on.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server for `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the scrape endpoint should bind to.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Describe all metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or installed.
    /// A recorder that is already installed (several services in one test
    /// process) is tolerated and leaves [`handle`](Self::handle) empty.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this instance did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(
        "recsys_consumer_messages_processed_total",
        "Messages handled successfully by a consumer group"
    );
    describe_counter!(
        "recsys_consumer_messages_skipped_total",
        "Messages dropped because they failed to decode or the handler failed"
    );
    describe_counter!(
        "recsys_consumer_messages_ignored_total",
        "Messages with an event kind this build does not know"
    );
    describe_histogram!(
        "recsys_consumer_handle_duration_seconds",
        "Time spent in the event handler per message"
    );
    describe_counter!(
        "recsys_event_publish_failures_total",
        "Domain events that could not be published after the write committed"
    );
    describe_counter!(
        "recsys_cache_requests_total",
        "Cache lookups by key family and result (hit, miss, error)"
    );
}

/// Consumer metrics recorder.
pub struct ConsumerMetrics;

impl ConsumerMetrics {
    /// Record a successfully handled message.
    pub fn record_processed(consumer: &str, topic: &str, duration: Duration) {
        counter!(
            "recsys_consumer_messages_processed_total",
            "consumer" => consumer.to_string(),
            "topic" => topic.to_string()
        )
        .increment(1);
        histogram!(
            "recsys_consumer_handle_duration_seconds",
            "consumer" => consumer.to_string()
        )
        .record(duration.as_secs_f64());
    }

    /// Record a dropped message. `reason` is `decode`, `handler` or `transport`.
    pub fn record_skipped(consumer: &str, topic: &str, reason: &'static str) {
        counter!(
            "recsys_consumer_messages_skipped_total",
            "consumer" => consumer.to_string(),
            "topic" => topic.to_string(),
            "reason" => reason
        )
        .increment(1);
    }

    /// Record a message of an unknown kind.
    pub fn record_ignored(consumer: &str, topic: &str) {
        counter!(
            "recsys_consumer_messages_ignored_total",
            "consumer" => consumer.to_string(),
            "topic" => topic.to_string()
        )
        .increment(1);
    }
}

/// Event publish metrics recorder.
pub struct PublishMetrics;

impl PublishMetrics {
    /// Record an event that was committed but not published.
    pub fn record_failure(topic: &str) {
        counter!("recsys_event_publish_failures_total", "topic" => topic.to_string()).increment(1);
    }
}

/// Cache metrics recorder.
pub struct CacheMetrics;

impl CacheMetrics {
    /// Record a hit for a key family (`user`, `recommendations`).
    pub fn record_hit(family: &'static str) {
        counter!("recsys_cache_requests_total", "family" => family, "result" => "hit").increment(1);
    }

    /// Record a miss.
    pub fn record_miss(family: &'static str) {
        counter!("recsys_cache_requests_total", "family" => family, "result" => "miss")
            .increment(1);
    }

    /// Record a failed cache call, treated as a miss by the caller.
    pub fn record_error(family: &'static str) {
        counter!("recsys_cache_requests_total", "family" => family, "result" => "error")
            .increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_server_creation() {
        let addr = "127.0.0.1:9090".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
        assert_eq!(server.addr(), addr);
    }

    #[test]
    fn test_metrics_server_render() {
        let mut server = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        server.start().unwrap();

        ConsumerMetrics::record_processed("analytics", "user_updates", Duration::from_millis(3));
        ConsumerMetrics::record_skipped("analytics", "user_updates", "decode");
        PublishMetrics::record_failure("user_updates");
        CacheMetrics::record_miss("user");

        // Another test may have installed the recorder first; metrics are
        // still recorded, there is just nothing to render from here.
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("recsys_consumer_messages_processed_total"));
            assert!(rendered.contains("recsys_consumer_messages_skipped_total"));
            assert!(rendered.contains("recsys_event_publish_failures_total"));
            assert!(rendered.contains("recsys_cache_requests_total"));
        }
    }

    #[test]
    fn test_second_start_is_tolerated() {
        let mut first = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        let mut second = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        assert!(first.start().is_ok());
        assert!(second.start().is_ok());
    }
}
