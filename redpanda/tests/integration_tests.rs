//! Integration tests for [`RedpandaEventBus`] with a real Kafka instance.
//!
//! These tests use testcontainers to spin up Kafka and validate:
//! - Publish/subscribe round trip with message keys
//! - Independent consumer groups each seeing every message
//! - Idempotent topic creation and deletion
//!
//! # Running These Tests
//!
//! Marked `#[ignore]` because they need Docker and take 15-60 seconds each to
//! start Kafka:
//! ```bash
//! cargo test -p recsys-redpanda --test integration_tests -- --ignored
//! ```

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use futures::StreamExt;
use recsys_core::event::DomainEvent;
use recsys_core::event_bus::{BusMessage, EventBus, EventStream, publish_event};
use recsys_core::topic::{ANALYTICS_GROUP, RECOMMENDATION_GROUP, Topic};
use recsys_redpanda::RedpandaEventBus;
use std::time::Duration;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::kafka::{KAFKA_PORT, Kafka};

async fn start_kafka() -> (ContainerAsync<Kafka>, RedpandaEventBus) {
    let kafka = Kafka::default()
        .with_env_var("KAFKA_AUTO_CREATE_TOPICS_ENABLE", "false")
        .start()
        .await
        .expect("Failed to start Kafka container");

    let host = kafka.get_host().await.expect("Failed to get host");
    let port = kafka
        .get_host_port_ipv4(KAFKA_PORT)
        .await
        .expect("Failed to get port");
    let brokers = format!("{host}:{port}");

    let bus = RedpandaEventBus::builder()
        .brokers(&brokers)
        .auto_offset_reset("earliest")
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create event bus");

    // The admin API answers only once the broker is up.
    for attempt in 1..=60 {
        if bus.create_topic("warmup", 1, 1).await.is_ok() {
            break;
        }
        assert!(attempt != 60, "Kafka failed to become ready");
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    (kafka, bus)
}

async fn collect(stream: &mut EventStream, count: usize) -> Vec<BusMessage> {
    let mut received = Vec::new();
    tokio::time::timeout(Duration::from_secs(20), async {
        while received.len() < count {
            match stream.next().await {
                Some(Ok(message)) => received.push(message),
                Some(Err(e)) => panic!("Transport error: {e}"),
                None => panic!("Stream ended early"),
            }
        }
    })
    .await
    .expect("Timeout waiting for messages");
    received
}

#[tokio::test]
#[ignore]
async fn publish_and_subscribe_round_trip() {
    let (_kafka, bus) = start_kafka().await;
    bus.create_topic("round-trip", 1, 1)
        .await
        .expect("Failed to create topic");

    let mut stream = bus
        .subscribe("round-trip", "round-trip-group")
        .await
        .expect("Failed to subscribe");

    bus.publish("round-trip", Some("7"), br#"{"event":"a"}"#)
        .await
        .expect("Failed to publish first message");
    bus.publish("round-trip", None, br#"{"event":"b"}"#)
        .await
        .expect("Failed to publish second message");

    let received = collect(&mut stream, 2).await;
    assert_eq!(received[0].topic, "round-trip");
    assert_eq!(received[0].key.as_deref(), Some(b"7".as_slice()));
    assert_eq!(received[0].payload, br#"{"event":"a"}"#);
    assert_eq!(received[1].key, None);
    assert!(received[1].offset > received[0].offset);
}

#[tokio::test]
#[ignore]
async fn each_group_sees_every_event() {
    let (_kafka, bus) = start_kafka().await;
    let topic = Topic::UserUpdates;
    bus.create_topic(topic.as_str(), 3, 1)
        .await
        .expect("Failed to create topic");

    let mut recommendation = bus
        .subscribe(topic.as_str(), RECOMMENDATION_GROUP)
        .await
        .expect("Failed to subscribe recommendation group");
    let mut analytics = bus
        .subscribe(topic.as_str(), ANALYTICS_GROUP)
        .await
        .expect("Failed to subscribe analytics group");

    let events = [
        DomainEvent::UserLiked {
            user_id: 1,
            product_id: 10,
            like: None,
        },
        DomainEvent::UserPurchased {
            user_id: 1,
            product_id: 11,
            purchase: None,
        },
    ];
    for event in &events {
        publish_event(&bus, topic, event)
            .await
            .expect("Failed to publish event");
    }

    for stream in [&mut recommendation, &mut analytics] {
        let decoded: Vec<DomainEvent> = collect(stream, 2)
            .await
            .iter()
            .map(|m| DomainEvent::decode(&m.payload).expect("Failed to decode"))
            .collect();
        // Same key, same partition: order is preserved.
        assert_eq!(decoded, events);
    }
}

#[tokio::test]
#[ignore]
async fn topic_admin_is_idempotent() {
    let (_kafka, bus) = start_kafka().await;

    bus.create_topic("admin", 1, 1)
        .await
        .expect("First create failed");
    bus.create_topic("admin", 1, 1)
        .await
        .expect("Creating an existing topic should succeed");

    bus.delete_topic("admin").await.expect("Delete failed");
    bus.delete_topic("admin")
        .await
        .expect("Deleting a missing topic should succeed");
    bus.delete_topic("never-created")
        .await
        .expect("Deleting a missing topic should succeed");
}
