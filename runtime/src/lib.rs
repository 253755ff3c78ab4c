//! # Recsys Runtime
//!
//! Background machinery shared by the service binaries:
//!
//! - [`handler::EventHandler`]: what a consumer group does with one event
//! - [`consumer::TopicConsumer`]: one cancellable task per subscribed topic,
//!   skip-and-continue on bad messages
//! - [`shutdown`]: signal handling and bounded waits on task handles
//! - [`metrics`]: Prometheus recorder and the platform's counters
//!
//! ## Example
//!
//! ```rust,ignore
//! use recsys_runtime::{Shutdown, TopicConsumer};
//!
//! let shutdown = Shutdown::new();
//! let handles = TopicConsumer::new("analytics", ANALYTICS_GROUP, &INTERACTION_TOPICS, bus, handler)
//!     .spawn(&shutdown);
//!
//! shutdown_signal().await;
//! shutdown.trigger();
//! await_shutdown(handles, Duration::from_secs(2)).await;
//! ```

pub mod consumer;
pub mod handler;
pub mod metrics;
pub mod shutdown;

pub use consumer::{ConsumerStats, StatsSnapshot, TopicConsumer};
pub use handler::{EventHandler, HandlerError};
pub use shutdown::{Shutdown, ShutdownReport, await_shutdown, shutdown_signal};
