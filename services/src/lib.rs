//! # Recsys Services
//!
//! Domain services of the recommendation platform. Each service owns one
//! domain's repository, talks to its peers only through
//! [`DomainEvent`](recsys_core::event::DomainEvent)s, and treats the cache and
//! the bus as best-effort side effects of a committed write.
//!
//! | service | writes | publishes on |
//! |---------|--------|--------------|
//! | [`IdentityService`] | credentials | `user_updates` |
//! | [`UserService`] | profiles, likes, dislikes, purchases | `user_updates` |
//! | [`ProductService`] | products | `product_updates` |
//! | [`RecommendationService`] | scores, snapshots | `recommendation_updates` |
//! | [`AnalyticsService`] | counters | |
//!
//! The recommendation and analytics services are driven by the handlers in
//! [`handlers`], run by `recsys_runtime::TopicConsumer`.

pub mod analytics;
pub mod config;
mod effects;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod password;
pub mod product;
pub mod recommendation;
pub mod token;
pub mod user;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use analytics::AnalyticsService;
pub use config::{CacheConfig, ScoringConfig};
pub use error::{Result, ServiceError};
pub use handlers::{AnalyticsEventHandler, RecommendationEventHandler};
pub use identity::IdentityService;
pub use password::PasswordHasher;
pub use product::ProductService;
pub use recommendation::RecommendationService;
pub use token::TokenIssuer;
pub use user::UserService;
