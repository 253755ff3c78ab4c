//! In-memory event bus.
//!
//! Every topic is an append-only log. A subscription replays the log from the
//! start and then follows new messages, the way a fresh consumer group with
//! `auto.offset.reset=earliest` would. Consumer groups are not load-balanced:
//! each subscription sees every message.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use recsys_core::event::DomainEvent;
use recsys_core::event_bus::{BusMessage, EventBus, EventBusError, EventStream};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

const LIVE_CAPACITY: usize = 1024;

struct TopicLog {
    messages: Vec<BusMessage>,
    live: broadcast::Sender<BusMessage>,
}

impl TopicLog {
    fn new() -> Self {
        let (live, _) = broadcast::channel(LIVE_CAPACITY);
        Self {
            messages: Vec::new(),
            live,
        }
    }
}

#[derive(Default)]
struct BusState {
    logs: HashMap<String, TopicLog>,
    created: HashSet<String>,
}

/// In-memory [`EventBus`] for tests.
///
/// # Example
///
/// ```
/// use recsys_testing::InMemoryEventBus;
/// use recsys_core::event_bus::EventBus;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InMemoryEventBus::new();
/// bus.publish("user_updates", Some("1"), br#"{"event":"user_liked"}"#).await?;
/// assert_eq!(bus.published("user_updates").len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    state: Arc<Mutex<BusState>>,
    fail_publish: Arc<AtomicBool>,
}

impl InMemoryEventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail (or succeed again).
    pub fn set_publish_failure(&self, failing: bool) {
        self.fail_publish.store(failing, Ordering::SeqCst);
    }

    /// Everything published to `topic` so far.
    #[must_use]
    pub fn published(&self, topic: &str) -> Vec<BusMessage> {
        self.state
            .lock()
            .unwrap()
            .logs
            .get(topic)
            .map(|log| log.messages.clone())
            .unwrap_or_default()
    }

    /// Published messages on `topic` that decode to an event.
    #[must_use]
    pub fn published_events(&self, topic: &str) -> Vec<DomainEvent> {
        self.published(topic)
            .iter()
            .filter_map(|message| DomainEvent::decode(&message.payload).ok())
            .collect()
    }

    /// Topics created through [`EventBus::create_topic`] and not deleted.
    #[must_use]
    pub fn created_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .created
            .iter()
            .cloned()
            .collect();
        topics.sort();
        topics
    }

    fn append(&self, topic: &str, key: Option<&str>, payload: &[u8]) {
        let mut state = self.state.lock().unwrap();
        let log = state
            .logs
            .entry(topic.to_string())
            .or_insert_with(TopicLog::new);

        let message = BusMessage {
            topic: topic.to_string(),
            key: key.map(|k| k.as_bytes().to_vec()),
            payload: payload.to_vec(),
            partition: 0,
            offset: i64::try_from(log.messages.len()).unwrap_or(i64::MAX),
        };
        log.messages.push(message.clone());
        // No live subscribers is fine; they replay the log on subscribe.
        let _ = log.live.send(message);
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let result = if self.fail_publish.load(Ordering::SeqCst) {
            Err(EventBusError::PublishFailed {
                topic: topic.to_string(),
                reason: "injected publish failure".to_string(),
            })
        } else {
            self.append(topic, key, payload);
            Ok(())
        };
        Box::pin(async move { result })
    }

    fn subscribe(
        &self,
        topic: &str,
        _group: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let (history, mut live) = {
            let mut state = self.state.lock().unwrap();
            let log = state
                .logs
                .entry(topic.to_string())
                .or_insert_with(TopicLog::new);
            (log.messages.clone(), log.live.subscribe())
        };

        let stream: EventStream = Box::pin(async_stream::stream! {
            for message in history {
                yield Ok(message);
            }
            loop {
                match live.recv().await {
                    Ok(message) => yield Ok(message),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        yield Err(EventBusError::TransportError(format!(
                            "subscriber lagged, {missed} messages dropped"
                        )));
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Box::pin(async move { Ok(stream) })
    }

    fn create_topic(
        &self,
        topic: &str,
        _partitions: i32,
        _replication: i32,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        {
            let mut state = self.state.lock().unwrap();
            state.created.insert(topic.to_string());
            state
                .logs
                .entry(topic.to_string())
                .or_insert_with(TopicLog::new);
        }
        Box::pin(async { Ok(()) })
    }

    fn delete_topic(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        {
            let mut state = self.state.lock().unwrap();
            state.created.remove(topic);
            state.logs.remove(topic);
        }
        Box::pin(async { Ok(()) })
    }
}
