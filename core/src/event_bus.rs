//! Event bus abstraction.
//!
//! This module provides the [`EventBus`] trait: a thin reliable-publish /
//! durable-subscribe wrapper over a partitioned log broker.
//!
//! # Delivery
//!
//! - **At-least-once**: a message may be delivered more than once.
//! - **Ordered within a partition**: messages sharing a key keep their order.
//! - **No ordering across topics**: handlers must tolerate reordering between,
//!   say, a `product_updated` and a `user_liked` referencing that product.
//!
//! # Subscriptions
//!
//! [`EventBus::subscribe`] binds one stream to one topic within a consumer
//! group, so replicas sharing a group split the topic's partitions. The runtime
//! runs one task per subscribed topic.
//!
//! # Implementations
//!
//! - `InMemoryEventBus` (recsys-testing): for tests
//! - `RedpandaEventBus` (recsys-redpanda): Kafka-compatible brokers
//!
//! # Example
//!
//! ```rust,ignore
//! use recsys_core::event_bus::{publish_event, EventBus};
//! use recsys_core::topic::Topic;
//! use futures::StreamExt;
//!
//! publish_event(&event_bus, Topic::UserUpdates, &event).await?;
//!
//! let mut stream = event_bus.subscribe("user_updates", "analytics_service_group").await?;
//! while let Some(result) = stream.next().await {
//!     match result {
//!         Ok(message) => handle(&message.payload),
//!         Err(e) => tracing::error!(error = %e, "Event stream error"),
//!     }
//! }
//! ```

use crate::event::DomainEvent;
use crate::topic::Topic;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    /// Failed to connect to the event bus
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish an event to a topic
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to subscribe to a topic
    #[error("Subscription failed for topic '{topic}' (group '{group}'): {reason}")]
    SubscriptionFailed {
        /// The topic
        topic: String,
        /// The consumer group
        group: String,
        /// The reason for failure
        reason: String,
    },

    /// Topic creation or deletion failed
    #[error("Topic administration failed for '{topic}': {reason}")]
    TopicAdminFailed {
        /// The topic
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// A received message could not be read
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Network or transport error
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// A message received from a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Topic the message was read from
    pub topic: String,
    /// Message key, if any
    pub key: Option<Vec<u8>>,
    /// Message body
    pub payload: Vec<u8>,
    /// Partition
    pub partition: i32,
    /// Offset within the partition
    pub offset: i64,
}

/// Stream of messages from one subscription.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<BusMessage, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// so services and consumers can share an `Arc<dyn EventBus>`.
pub trait EventBus: Send + Sync {
    /// Publish a payload to a topic.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the broker rejects the
    /// message or does not acknowledge it in time. The caller decides whether
    /// to retry or drop.
    fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to one topic as a member of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if the consumer cannot be
    /// created or the subscription is rejected.
    fn subscribe(
        &self,
        topic: &str,
        group: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;

    /// Create a topic. Creating a topic that already exists succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::TopicAdminFailed`] for any other failure.
    fn create_topic(
        &self,
        topic: &str,
        partitions: i32,
        replication: i32,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Delete a topic. Deleting a missing topic succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::TopicAdminFailed`] for any other failure.
    fn delete_topic(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;
}

/// Encode a [`DomainEvent`] and publish it keyed by its subject id.
///
/// # Errors
///
/// Returns [`EventBusError::PublishFailed`] if the event cannot be encoded or
/// the publish fails.
pub async fn publish_event(
    bus: &dyn EventBus,
    topic: Topic,
    event: &DomainEvent,
) -> Result<(), EventBusError> {
    let payload = event.encode().map_err(|e| EventBusError::PublishFailed {
        topic: topic.to_string(),
        reason: e.to_string(),
    })?;
    let key = event.partition_key();
    bus.publish(topic.as_str(), key.as_deref(), &payload).await
}

/// Create every topic in `topics`, stopping at the first failure.
///
/// # Errors
///
/// Returns the first [`EventBusError::TopicAdminFailed`].
pub async fn ensure_topics(
    bus: &dyn EventBus,
    topics: &[Topic],
    partitions: i32,
    replication: i32,
) -> Result<(), EventBusError> {
    for topic in topics {
        bus.create_topic(topic.as_str(), partitions, replication)
            .await?;
    }
    Ok(())
}
