//! Consumer group runtime with one cancellable task per topic.
//!
//! A [`TopicConsumer`] binds an [`EventHandler`] to a consumer group and a set of
//! topics. [`TopicConsumer::spawn`] starts one task per topic, each running the
//! subscribe-process-reconnect loop:
//!
//! ```text
//! loop {
//!     subscribe(topic, group)       // retry after delay on failure
//!     loop {
//!         select! {
//!             shutdown  => return
//!             message   => decode, handle, count
//!         }
//!     }
//!     stream ended: wait and resubscribe
//! }
//! ```
//!
//! # Poison messages
//!
//! Nothing a message contains can stop a task. A payload that is not a valid
//! event, a known kind with missing fields, or a handler error is logged and
//! counted as skipped; an unknown kind is counted as ignored. Either way the
//! loop moves on to the next message.
//!
//! # Shutdown
//!
//! Each task holds its own [`Shutdown`] receiver. The signal is only observed
//! between messages, so a handler call in flight always completes.

use crate::handler::EventHandler;
use crate::metrics::ConsumerMetrics;
use crate::shutdown::Shutdown;
use futures::StreamExt;
use recsys_core::event::DomainEvent;
use recsys_core::event_bus::{BusMessage, EventBus, EventStream};
use recsys_core::topic::Topic;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Counters shared by every task of one consumer.
#[derive(Debug, Default)]
pub struct ConsumerStats {
    processed: AtomicU64,
    skipped: AtomicU64,
    ignored: AtomicU64,
}

/// Point-in-time copy of [`ConsumerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Messages the handler accepted
    pub processed: u64,
    /// Messages dropped on decode, handler, or transport errors
    pub skipped: u64,
    /// Messages of unknown kind
    pub ignored: u64,
}

impl ConsumerStats {
    /// Messages the handler accepted.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Messages dropped on error.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Messages of unknown kind.
    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }

    /// Read all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed(),
            skipped: self.skipped(),
            ignored: self.ignored(),
        }
    }
}

/// A consumer group bound to a handler.
///
/// # Example
///
/// ```rust,ignore
/// let consumer = TopicConsumer::new(
///     "recommendation",
///     RECOMMENDATION_GROUP,
///     &INTERACTION_TOPICS,
///     event_bus,
///     handler,
/// );
/// let stats = consumer.stats();
/// let handles = consumer.spawn(&shutdown);
/// ```
pub struct TopicConsumer {
    name: String,
    group: String,
    topics: Vec<Topic>,
    event_bus: Arc<dyn EventBus>,
    handler: Arc<dyn EventHandler>,
    retry_delay: Duration,
    stats: Arc<ConsumerStats>,
}

impl TopicConsumer {
    /// Create a consumer named `name` (for logs and metrics) joining `group`.
    ///
    /// The default retry delay after a failed subscription or a closed stream
    /// is 5 seconds.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        topics: &[Topic],
        event_bus: Arc<dyn EventBus>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            topics: topics.to_vec(),
            event_bus,
            handler,
            retry_delay: Duration::from_secs(5),
            stats: Arc::new(ConsumerStats::default()),
        }
    }

    /// Set custom retry delay.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Counters for this consumer, live while its tasks run.
    #[must_use]
    pub fn stats(&self) -> Arc<ConsumerStats> {
        Arc::clone(&self.stats)
    }

    /// Spawn one task per topic. Every task stops when `shutdown` is triggered.
    #[must_use]
    pub fn spawn(self, shutdown: &Shutdown) -> Vec<JoinHandle<()>> {
        self.topics
            .iter()
            .map(|topic| {
                let task = TopicTask {
                    consumer: self.name.clone(),
                    group: self.group.clone(),
                    topic: topic.as_str(),
                    event_bus: Arc::clone(&self.event_bus),
                    handler: Arc::clone(&self.handler),
                    shutdown: shutdown.subscribe(),
                    retry_delay: self.retry_delay,
                    stats: Arc::clone(&self.stats),
                };
                tokio::spawn(task.run())
            })
            .collect()
    }
}

/// Outcome of draining one subscription.
enum StreamEnd {
    Shutdown,
    Closed,
}

struct TopicTask {
    consumer: String,
    group: String,
    topic: &'static str,
    event_bus: Arc<dyn EventBus>,
    handler: Arc<dyn EventHandler>,
    shutdown: broadcast::Receiver<()>,
    retry_delay: Duration,
    stats: Arc<ConsumerStats>,
}

impl TopicTask {
    async fn run(mut self) {
        info!(consumer = %self.consumer, topic = self.topic, group = %self.group, "Topic consumer started");

        loop {
            let subscribed = tokio::select! {
                _ = self.shutdown.recv() => break,
                result = self.event_bus.subscribe(self.topic, &self.group) => result,
            };

            match subscribed {
                Ok(mut stream) => {
                    info!(consumer = %self.consumer, topic = self.topic, "Subscribed to event bus");
                    if let StreamEnd::Shutdown = self.drain(&mut stream).await {
                        break;
                    }
                    warn!(
                        consumer = %self.consumer,
                        topic = self.topic,
                        "Event stream ended, reconnecting in {:?}",
                        self.retry_delay
                    );
                }
                Err(e) => {
                    error!(
                        consumer = %self.consumer,
                        topic = self.topic,
                        error = %e,
                        "Failed to subscribe, retrying in {:?}",
                        self.retry_delay
                    );
                }
            }

            tokio::select! {
                _ = self.shutdown.recv() => break,
                () = tokio::time::sleep(self.retry_delay) => {}
            }
        }

        info!(consumer = %self.consumer, topic = self.topic, "Topic consumer stopped");
    }

    async fn drain(&mut self, stream: &mut EventStream) -> StreamEnd {
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => return StreamEnd::Shutdown,
                next = stream.next() => match next {
                    Some(Ok(message)) => self.process(&message).await,
                    Some(Err(e)) => {
                        error!(consumer = %self.consumer, topic = self.topic, error = %e, "Error receiving message");
                        self.skip("transport");
                    }
                    None => return StreamEnd::Closed,
                },
            }
        }
    }

    async fn process(&self, message: &BusMessage) {
        let event = match DomainEvent::decode(&message.payload) {
            Ok(DomainEvent::Unrecognized { kind }) => {
                debug!(
                    consumer = %self.consumer,
                    topic = self.topic,
                    kind = %kind,
                    offset = message.offset,
                    "Ignoring unknown event kind"
                );
                self.stats.ignored.fetch_add(1, Ordering::Relaxed);
                ConsumerMetrics::record_ignored(&self.consumer, self.topic);
                return;
            }
            Ok(event) => event,
            Err(e) => {
                warn!(
                    consumer = %self.consumer,
                    topic = self.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "Skipping undecodable message"
                );
                self.skip("decode");
                return;
            }
        };

        let started = Instant::now();
        match self.handler.handle(&event).await {
            Ok(()) => {
                debug!(consumer = %self.consumer, topic = self.topic, kind = event.kind(), "Event handled");
                self.stats.processed.fetch_add(1, Ordering::Relaxed);
                ConsumerMetrics::record_processed(&self.consumer, self.topic, started.elapsed());
            }
            Err(e) => {
                error!(
                    consumer = %self.consumer,
                    topic = self.topic,
                    kind = event.kind(),
                    error = %e,
                    "Failed to handle event"
                );
                self.skip("handler");
            }
        }
    }

    fn skip(&self, reason: &'static str) {
        self.stats.skipped.fetch_add(1, Ordering::Relaxed);
        ConsumerMetrics::record_skipped(&self.consumer, self.topic, reason);
    }
}
