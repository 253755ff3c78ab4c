//! Redpanda event bus for the recommendation platform.
//!
//! This crate implements the [`EventBus`] trait from `recsys-core` on top of
//! rdkafka, so it works against Redpanda, Apache Kafka, or any other
//! Kafka-compatible broker.
//!
//! # Delivery Semantics
//!
//! **At-least-once delivery** with manual offset commits:
//! - Offsets are committed AFTER the message is handed to the subscriber's channel
//! - If the process crashes before commit, messages will be redelivered
//! - Handlers must tolerate duplicates
//! - Ordering is guaranteed within a partition (messages are keyed by subject id)
//!
//! # Subscriptions
//!
//! Every [`EventBus::subscribe`] call creates its own consumer bound to one topic
//! and one consumer group. Replicas of a service that share a group split the
//! topic's partitions between them.
//!
//! # Topic administration
//!
//! [`EventBus::create_topic`] and [`EventBus::delete_topic`] go through the
//! broker's admin API. "Already exists" on create and "unknown topic" on delete
//! are reported as success.
//!
//! # Example
//!
//! ```no_run
//! use recsys_redpanda::RedpandaEventBus;
//! use recsys_core::event_bus::EventBus;
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let event_bus = RedpandaEventBus::new("localhost:9092")?;
//!
//! event_bus.create_topic("user_updates", 1, 1).await?;
//! event_bus.publish("user_updates", Some("1"), br#"{"event":"user_liked","user_id":1,"product_id":2}"#).await?;
//!
//! let mut stream = event_bus.subscribe("user_updates", "analytics_service_group").await?;
//! while let Some(result) = stream.next().await {
//!     match result {
//!         Ok(message) => println!("Received {} bytes", message.payload.len()),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use recsys_core::event_bus::{BusMessage, EventBus, EventBusError, EventStream};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Redpanda event bus implementation.
///
/// Holds one producer and one admin client for the lifetime of the service.
/// Consumers are created per subscription.
///
/// # Example
///
/// ```no_run
/// use recsys_redpanda::RedpandaEventBus;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Basic configuration
/// let event_bus = RedpandaEventBus::new("localhost:9092")?;
///
/// // Custom configuration
/// let event_bus = RedpandaEventBus::builder()
///     .brokers("localhost:9092,localhost:9093")
///     .producer_acks("all")  // Wait for all replicas
///     .auto_offset_reset("earliest")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RedpandaEventBus {
    /// Kafka producer for publishing events
    producer: FutureProducer,
    /// Admin client for topic lifecycle
    admin: AdminClient<DefaultClientContext>,
    /// Broker addresses (for creating consumers)
    brokers: String,
    /// Producer and admin timeout
    timeout: Duration,
    /// Buffer between a consumer task and its subscriber
    buffer_size: usize,
    /// Auto offset reset policy for new groups
    auto_offset_reset: String,
    /// Consumer session timeout
    session_timeout_ms: u32,
}

impl RedpandaEventBus {
    /// Create a new Redpanda event bus with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if the producer or admin
    /// client cannot be created.
    pub fn new(brokers: &str) -> Result<Self, EventBusError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a new builder for configuring the event bus.
    #[must_use]
    pub fn builder() -> RedpandaEventBusBuilder {
        RedpandaEventBusBuilder::default()
    }

    /// Get a reference to the brokers string.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    fn admin_options(&self) -> AdminOptions {
        AdminOptions::new().operation_timeout(Some(Timeout::After(self.timeout)))
    }
}

/// Builder for configuring a [`RedpandaEventBus`].
#[derive(Default)]
pub struct RedpandaEventBusBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    compression: Option<String>,
    timeout: Option<Duration>,
    buffer_size: Option<usize>,
    auto_offset_reset: Option<String>,
    session_timeout_ms: Option<u32>,
}

impl RedpandaEventBusBuilder {
    /// Set the broker addresses (comma-separated).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the producer acknowledgment mode: "0", "1" or "all".
    ///
    /// Default: "1"
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the compression codec: "none", "gzip", "snappy", "lz4", "zstd".
    ///
    /// Default: "none"
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set the producer send and admin operation timeout.
    ///
    /// Default: 5 seconds
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the per-subscription buffer size. Zero is raised to one.
    ///
    /// Default: 1000
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size.max(1));
        self
    }

    /// Set the auto offset reset policy for new consumer groups:
    /// `"earliest"`, `"latest"` or `"error"`.
    ///
    /// Default: "latest"
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Set the consumer session timeout in milliseconds.
    ///
    /// Default: 6000
    #[must_use]
    pub const fn session_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.session_timeout_ms = Some(timeout_ms);
        self
    }

    /// Build the [`RedpandaEventBus`].
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if:
    /// - Brokers not set
    /// - Cannot create producer or admin client
    pub fn build(self) -> Result<RedpandaEventBus, EventBusError> {
        let brokers = self.brokers.ok_or_else(|| {
            EventBusError::ConnectionFailed("Brokers not configured".to_string())
        })?;
        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));
        let acks = self.producer_acks.as_deref().unwrap_or("1");
        let compression = self.compression.as_deref().unwrap_or("none");

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", acks)
            .set("compression.type", compression)
            .create()
            .map_err(|e| {
                EventBusError::ConnectionFailed(format!("Failed to create producer: {e}"))
            })?;

        let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .create()
            .map_err(|e| {
                EventBusError::ConnectionFailed(format!("Failed to create admin client: {e}"))
            })?;

        let buffer_size = self.buffer_size.unwrap_or(1000);
        let auto_offset_reset = self
            .auto_offset_reset
            .unwrap_or_else(|| "latest".to_string());
        let session_timeout_ms = self.session_timeout_ms.unwrap_or(6000);

        tracing::info!(
            brokers = %brokers,
            acks = acks,
            compression = compression,
            buffer_size = buffer_size,
            auto_offset_reset = %auto_offset_reset,
            "RedpandaEventBus created successfully"
        );

        Ok(RedpandaEventBus {
            producer,
            admin,
            brokers,
            timeout,
            buffer_size,
            auto_offset_reset,
            session_timeout_ms,
        })
    }
}

impl EventBus for RedpandaEventBus {
    fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let key = key.map(str::to_string);
        let payload = payload.to_vec();
        let timeout = self.timeout;

        Box::pin(async move {
            let mut record = FutureRecord::<str, [u8]>::to(&topic).payload(payload.as_slice());
            if let Some(key) = key.as_deref() {
                record = record.key(key);
            }

            match self.producer.send(record, Timeout::After(timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %topic,
                        partition = partition,
                        offset = offset,
                        "Event published successfully"
                    );
                    Ok(())
                },
                Err((kafka_error, _)) => {
                    tracing::error!(
                        topic = %topic,
                        error = %kafka_error,
                        "Failed to publish event"
                    );
                    Err(EventBusError::PublishFailed {
                        topic,
                        reason: kafka_error.to_string(),
                    })
                },
            }
        })
    }

    fn subscribe(
        &self,
        topic: &str,
        group: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let group = group.to_string();
        let brokers = self.brokers.clone();
        let buffer_size = self.buffer_size;
        let auto_offset_reset = self.auto_offset_reset.clone();
        let session_timeout_ms = self.session_timeout_ms;

        Box::pin(async move {
            let subscription_failed = |reason: String| EventBusError::SubscriptionFailed {
                topic: topic.clone(),
                group: group.clone(),
                reason,
            };

            // Manual commit for at-least-once
            let consumer: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", &brokers)
                .set("group.id", &group)
                .set("enable.auto.commit", "false")
                .set("auto.offset.reset", &auto_offset_reset)
                .set("session.timeout.ms", session_timeout_ms.to_string())
                .set("enable.partition.eof", "false")
                .create()
                .map_err(|e| subscription_failed(format!("Failed to create consumer: {e}")))?;

            consumer
                .subscribe(&[topic.as_str()])
                .map_err(|e| subscription_failed(format!("Failed to subscribe to topic: {e}")))?;

            tracing::info!(
                topic = %topic,
                consumer_group = %group,
                buffer_size = buffer_size,
                auto_offset_reset = %auto_offset_reset,
                manual_commit = true,
                "Subscribed to topic"
            );

            let (tx, rx) = tokio::sync::mpsc::channel(buffer_size);

            // The task owns the consumer and stops once the subscriber drops the stream.
            tokio::spawn(async move {
                use futures::StreamExt;
                use rdkafka::consumer::CommitMode;

                let mut stream = consumer.stream();

                while let Some(msg_result) = stream.next().await {
                    match msg_result {
                        Ok(message) => {
                            let item = match message.payload() {
                                Some(payload) => Ok(BusMessage {
                                    topic: message.topic().to_string(),
                                    key: message.key().map(<[u8]>::to_vec),
                                    payload: payload.to_vec(),
                                    partition: message.partition(),
                                    offset: message.offset(),
                                }),
                                None => Err(EventBusError::DeserializationFailed(format!(
                                    "Message at {}/{}@{} has no payload",
                                    message.topic(),
                                    message.partition(),
                                    message.offset()
                                ))),
                            };

                            if tx.send(item).await.is_err() {
                                tracing::debug!("Channel receiver dropped, exiting consumer task");
                                break; // exit WITHOUT committing
                            }

                            // Commit only after delivery to the channel
                            if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
                                tracing::warn!(
                                    topic = message.topic(),
                                    partition = message.partition(),
                                    offset = message.offset(),
                                    error = %e,
                                    "Failed to commit offset (message may be redelivered)"
                                );
                            }
                        },
                        Err(e) => {
                            let err = EventBusError::TransportError(format!(
                                "Failed to receive message: {e}"
                            ));
                            if tx.send(Err(err)).await.is_err() {
                                break;
                            }
                        },
                    }
                }

                tracing::debug!("Consumer task exiting");
            });

            let stream = async_stream::stream! {
                let mut rx = rx;
                while let Some(result) = rx.recv().await {
                    yield result;
                }
            };

            Ok(Box::pin(stream) as EventStream)
        })
    }

    fn create_topic(
        &self,
        topic: &str,
        partitions: i32,
        replication: i32,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();

        Box::pin(async move {
            let new_topic = NewTopic::new(&topic, partitions, TopicReplication::Fixed(replication));
            let results = self
                .admin
                .create_topics([&new_topic], &self.admin_options())
                .await
                .map_err(|e| EventBusError::TopicAdminFailed {
                    topic: topic.clone(),
                    reason: e.to_string(),
                })?;

            for result in results {
                match result {
                    Ok(name) => {
                        tracing::info!(topic = %name, partitions, replication, "Topic created");
                    },
                    Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                        tracing::info!(topic = %name, "Topic already exists");
                    },
                    Err((name, code)) => {
                        return Err(EventBusError::TopicAdminFailed {
                            topic: name,
                            reason: code.to_string(),
                        });
                    },
                }
            }
            Ok(())
        })
    }

    fn delete_topic(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();

        Box::pin(async move {
            let results = self
                .admin
                .delete_topics(&[topic.as_str()], &self.admin_options())
                .await
                .map_err(|e| EventBusError::TopicAdminFailed {
                    topic: topic.clone(),
                    reason: e.to_string(),
                })?;

            for result in results {
                match result {
                    Ok(name) => tracing::info!(topic = %name, "Topic deleted"),
                    Err((name, RDKafkaErrorCode::UnknownTopicOrPartition)) => {
                        tracing::info!(topic = %name, "Topic did not exist");
                    },
                    Err((name, code)) => {
                        return Err(EventBusError::TopicAdminFailed {
                            topic: name,
                            reason: code.to_string(),
                        });
                    },
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redpanda_event_bus_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RedpandaEventBus>();
        assert_sync::<RedpandaEventBus>();
    }

    #[test]
    fn build_without_brokers_fails() {
        let result = RedpandaEventBus::builder().build();
        assert!(matches!(result, Err(EventBusError::ConnectionFailed(_))));
    }

    #[test]
    fn zero_buffer_is_raised() {
        let builder = RedpandaEventBus::builder().buffer_size(0);
        assert_eq!(builder.buffer_size, Some(1));
    }
}
