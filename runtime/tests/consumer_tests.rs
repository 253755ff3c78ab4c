//! Consumer runtime tests against the in-memory bus.

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use recsys_core::event::DomainEvent;
use recsys_core::event_bus::{EventBus, publish_event};
use recsys_core::topic::{INTERACTION_TOPICS, Topic};
use recsys_runtime::{
    EventHandler, HandlerError, Shutdown, StatsSnapshot, TopicConsumer, await_shutdown,
};
use recsys_testing::{InMemoryEventBus, helpers};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every event; fails on purchases of product 13.
#[derive(Default)]
struct RecordingHandler {
    seen: Mutex<Vec<DomainEvent>>,
}

impl RecordingHandler {
    fn seen(&self) -> Vec<DomainEvent> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        if let DomainEvent::UserPurchased { product_id: 13, .. } = event {
            return Err("unlucky product".into());
        }
        self.seen.lock().unwrap().push(event.clone());
        Ok(())
    }
}

fn consumer(
    bus: &Arc<InMemoryEventBus>,
    handler: &Arc<RecordingHandler>,
    topics: &[Topic],
) -> TopicConsumer {
    TopicConsumer::new(
        "test",
        "test_group",
        topics,
        Arc::clone(bus) as Arc<dyn EventBus>,
        Arc::clone(handler) as Arc<dyn EventHandler>,
    )
    .with_retry_delay(Duration::from_millis(10))
}

#[tokio::test]
async fn poison_messages_do_not_stop_the_consumer() {
    let bus = Arc::new(InMemoryEventBus::new());
    let handler = Arc::new(RecordingHandler::default());
    let shutdown = Shutdown::new();

    let consumer = consumer(&bus, &handler, &[Topic::UserUpdates]);
    let stats = consumer.stats();
    let handles = consumer.spawn(&shutdown);

    bus.publish("user_updates", None, b"not json at all").await.unwrap();
    bus.publish("user_updates", None, br#"{"event":"user_liked","user_id":"x"}"#)
        .await
        .unwrap();
    bus.publish("user_updates", None, br#"{"event":"user_teleported","user_id":1}"#)
        .await
        .unwrap();
    publish_event(bus.as_ref(), Topic::UserUpdates, &helpers::purchased(1, 13))
        .await
        .unwrap();
    publish_event(bus.as_ref(), Topic::UserUpdates, &helpers::liked(1, 2))
        .await
        .unwrap();

    let expected = StatsSnapshot {
        processed: 1,
        skipped: 3,
        ignored: 1,
    };
    assert!(helpers::eventually(Duration::from_secs(2), || stats.snapshot() == expected).await);
    assert_eq!(handler.seen(), vec![helpers::liked(1, 2)]);

    shutdown.trigger();
    let report = await_shutdown(handles, Duration::from_secs(1)).await;
    assert_eq!(report.stopped, 1);
}

#[tokio::test]
async fn one_task_per_topic() {
    let bus = Arc::new(InMemoryEventBus::new());
    let handler = Arc::new(RecordingHandler::default());
    let shutdown = Shutdown::new();

    let consumer = consumer(&bus, &handler, &INTERACTION_TOPICS);
    let stats = consumer.stats();
    let handles = consumer.spawn(&shutdown);
    assert_eq!(handles.len(), 2);

    publish_event(bus.as_ref(), Topic::UserUpdates, &helpers::liked(1, 2))
        .await
        .unwrap();
    publish_event(
        bus.as_ref(),
        Topic::ProductUpdates,
        &DomainEvent::ProductDeleted { product_id: 2 },
    )
    .await
    .unwrap();

    assert!(helpers::eventually(Duration::from_secs(2), || stats.processed() == 2).await);

    shutdown.trigger();
    let report = await_shutdown(handles, Duration::from_secs(1)).await;
    assert_eq!(report.stopped, 2);
    assert_eq!(report.timed_out, 0);
}

#[tokio::test]
async fn shutdown_before_any_message_stops_promptly() {
    let bus = Arc::new(InMemoryEventBus::new());
    let handler = Arc::new(RecordingHandler::default());
    let shutdown = Shutdown::new();

    let handles = consumer(&bus, &handler, &INTERACTION_TOPICS).spawn(&shutdown);
    shutdown.trigger();

    let report = await_shutdown(handles, Duration::from_millis(500)).await;
    assert_eq!(report.stopped, 2);
    assert!(handler.seen().is_empty());
}

#[tokio::test]
async fn messages_published_after_shutdown_are_not_handled() {
    let bus = Arc::new(InMemoryEventBus::new());
    let handler = Arc::new(RecordingHandler::default());
    let shutdown = Shutdown::new();

    let consumer = consumer(&bus, &handler, &[Topic::UserUpdates]);
    let stats = consumer.stats();
    let handles = consumer.spawn(&shutdown);

    publish_event(bus.as_ref(), Topic::UserUpdates, &helpers::liked(1, 2))
        .await
        .unwrap();
    assert!(helpers::eventually(Duration::from_secs(2), || stats.processed() == 1).await);

    shutdown.trigger();
    await_shutdown(handles, Duration::from_secs(1)).await;

    publish_event(bus.as_ref(), Topic::UserUpdates, &helpers::liked(1, 3))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(stats.processed(), 1);
}
