//! Event handler trait implemented by each consumer group.

use async_trait::async_trait;
use recsys_core::event::DomainEvent;

/// Error type returned by handlers.
///
/// Boxed so handlers can surface repository, cache, or any other failure; the
/// consumer only logs it and moves on.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Processes one decoded event.
///
/// The consumer decodes the payload before calling the handler and never passes
/// `DomainEvent::Unrecognized`. Handlers ignore kinds they do not care about by
/// returning `Ok(())`.
///
/// Delivery is at-least-once and unordered across topics, so a handler may see
/// the same event twice or see an interaction before the product it refers to.
///
/// # Example
///
/// ```rust,ignore
/// struct CountingHandler { seen: AtomicU64 }
///
/// #[async_trait]
/// impl EventHandler for CountingHandler {
///     async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
///         if event.interaction().is_some() {
///             self.seen.fetch_add(1, Ordering::Relaxed);
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Any error aborts processing of this event only. The consumer logs it,
    /// counts the message as skipped and continues with the next one.
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError>;
}
