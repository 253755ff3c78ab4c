//! Topic names and consumer groups.
//!
//! Each service creates the topics it owns at startup and subscribes the
//! topics it cares about through a group shared by all of its replicas.

use std::fmt;

/// Bus topics used by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// User lifecycle and interaction events (owned by identity and user services).
    UserUpdates,
    /// Product catalogue events (owned by the product service).
    ProductUpdates,
    /// Recommendation snapshots (owned by the recommendation service).
    RecommendationUpdates,
}

impl Topic {
    /// All topics, in creation order.
    pub const ALL: [Self; 3] = [
        Self::UserUpdates,
        Self::ProductUpdates,
        Self::RecommendationUpdates,
    ];

    /// Wire name of the topic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserUpdates => "user_updates",
            Self::ProductUpdates => "product_updates",
            Self::RecommendationUpdates => "recommendation_updates",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumer group of the recommendation service.
pub const RECOMMENDATION_GROUP: &str = "recommendation_service_group";

/// Consumer group of the analytics service.
pub const ANALYTICS_GROUP: &str = "analytics_service_group";

/// Topics consumed by both the recommendation and analytics groups.
pub const INTERACTION_TOPICS: [Topic; 2] = [Topic::UserUpdates, Topic::ProductUpdates];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_wire_names() {
        assert_eq!(Topic::UserUpdates.to_string(), "user_updates");
        assert_eq!(Topic::ProductUpdates.as_str(), "product_updates");
        assert_eq!(Topic::RecommendationUpdates.as_str(), "recommendation_updates");
    }
}
