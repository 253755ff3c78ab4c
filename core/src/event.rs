//! Domain events exchanged over the bus.
//!
//! Events travel as JSON objects whose `event` field names the kind and whose
//! remaining fields carry the payload:
//!
//! ```json
//! {"event": "user_liked", "user_id": 1, "product_id": 42, "like": {...}}
//! ```
//!
//! # Decoding policy
//!
//! - Known kinds decode into their typed variant. A known kind with missing or
//!   mistyped required fields is [`EventDecodeError::Malformed`].
//! - Unknown kinds decode successfully into [`DomainEvent::Unrecognized`], which
//!   every consumer may ignore.
//! - Anything that is not a JSON object with a string `event` field is an error.
//!
//! Consumers log and skip decode errors; they never stop the read loop.
//!
//! # Example
//!
//! ```
//! use recsys_core::event::DomainEvent;
//!
//! let event = DomainEvent::decode(br#"{"event":"user_liked","user_id":1,"product_id":42}"#).unwrap();
//! assert_eq!(event.kind(), "user_liked");
//!
//! let other = DomainEvent::decode(br#"{"event":"cart_abandoned"}"#).unwrap();
//! assert!(matches!(other, DomainEvent::Unrecognized { .. }));
//! ```

use crate::model::{
    Dislike, Interaction, Like, Product, ProductId, Purchase, Recommendation, User, UserId,
    UserSummary,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from decoding or encoding a bus payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventDecodeError {
    /// Payload is not a JSON object.
    #[error("Event payload is not valid JSON: {0}")]
    InvalidJson(String),

    /// Payload has no string `event` field.
    #[error("Event payload has no 'event' field")]
    MissingKind,

    /// Known kind with missing or mistyped fields.
    #[error("Malformed '{kind}' event: {reason}")]
    Malformed {
        /// Event kind
        kind: String,
        /// Serde error message
        reason: String,
    },

    /// Failed to serialize an event.
    #[error("Failed to encode '{kind}' event: {reason}")]
    Encode {
        /// Event kind
        kind: String,
        /// Serde error message
        reason: String,
    },
}

/// The closed set of known facts, plus an escape hatch for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A user liked a product.
    UserLiked {
        /// Who
        user_id: UserId,
        /// What
        product_id: ProductId,
        /// Stored record
        #[serde(default, skip_serializing_if = "Option::is_none")]
        like: Option<Like>,
    },
    /// A user disliked a product.
    UserDisliked {
        /// Who
        user_id: UserId,
        /// What
        product_id: ProductId,
        /// Stored record
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dislike: Option<Dislike>,
    },
    /// A user purchased a product.
    UserPurchased {
        /// Who
        user_id: UserId,
        /// What
        product_id: ProductId,
        /// Stored record
        #[serde(default, skip_serializing_if = "Option::is_none")]
        purchase: Option<Purchase>,
    },
    /// A user registered.
    UserCreated {
        /// New user
        user: UserSummary,
    },
    /// A user profile changed.
    UserUpdated {
        /// Updated user
        user: User,
    },
    /// A product was added to the catalogue.
    ProductCreated {
        /// New product
        product: Product,
    },
    /// A product changed.
    ProductUpdated {
        /// Updated product
        product: Product,
    },
    /// A product was removed.
    ProductDeleted {
        /// Removed product
        product_id: ProductId,
    },
    /// A recommendation snapshot was recorded.
    RecommendationCreated {
        /// The snapshot
        recommendation: Recommendation,
    },
    /// Any kind this build does not know. Always safe to ignore.
    #[serde(skip)]
    Unrecognized {
        /// The `event` field as received
        kind: String,
    },
}

/// Only the discriminator, used to route before full decoding.
#[derive(Deserialize)]
struct Envelope {
    event: String,
}

const KNOWN_KINDS: [&str; 9] = [
    "user_liked",
    "user_disliked",
    "user_purchased",
    "user_created",
    "user_updated",
    "product_created",
    "product_updated",
    "product_deleted",
    "recommendation_created",
];

impl DomainEvent {
    /// Decode a bus payload.
    ///
    /// # Errors
    ///
    /// Returns [`EventDecodeError`] if the payload is not a JSON object with a
    /// string `event` field, or if a known kind lacks required fields.
    pub fn decode(payload: &[u8]) -> Result<Self, EventDecodeError> {
        let value: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| EventDecodeError::InvalidJson(e.to_string()))?;

        let envelope: Envelope =
            serde_json::from_value(value.clone()).map_err(|_| EventDecodeError::MissingKind)?;

        if !KNOWN_KINDS.contains(&envelope.event.as_str()) {
            return Ok(Self::Unrecognized {
                kind: envelope.event,
            });
        }

        serde_json::from_value(value).map_err(|e| EventDecodeError::Malformed {
            kind: envelope.event,
            reason: e.to_string(),
        })
    }

    /// Encode as a JSON bus payload.
    ///
    /// # Errors
    ///
    /// Returns [`EventDecodeError::Encode`] for [`DomainEvent::Unrecognized`],
    /// which has no payload to send.
    pub fn encode(&self) -> Result<Vec<u8>, EventDecodeError> {
        serde_json::to_vec(self).map_err(|e| EventDecodeError::Encode {
            kind: self.kind().to_string(),
            reason: e.to_string(),
        })
    }

    /// Wire name of the event kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::UserLiked { .. } => "user_liked",
            Self::UserDisliked { .. } => "user_disliked",
            Self::UserPurchased { .. } => "user_purchased",
            Self::UserCreated { .. } => "user_created",
            Self::UserUpdated { .. } => "user_updated",
            Self::ProductCreated { .. } => "product_created",
            Self::ProductUpdated { .. } => "product_updated",
            Self::ProductDeleted { .. } => "product_deleted",
            Self::RecommendationCreated { .. } => "recommendation_created",
            Self::Unrecognized { kind } => kind,
        }
    }

    /// The interaction carried by like/dislike/purchase events.
    #[must_use]
    pub const fn interaction(&self) -> Option<(Interaction, UserId, ProductId)> {
        match *self {
            Self::UserLiked {
                user_id,
                product_id,
                ..
            } => Some((Interaction::Like, user_id, product_id)),
            Self::UserDisliked {
                user_id,
                product_id,
                ..
            } => Some((Interaction::Dislike, user_id, product_id)),
            Self::UserPurchased {
                user_id,
                product_id,
                ..
            } => Some((Interaction::Purchase, user_id, product_id)),
            _ => None,
        }
    }

    /// Message key: the subject id, so events about one subject share a partition.
    #[must_use]
    pub fn partition_key(&self) -> Option<String> {
        match self {
            Self::UserLiked { user_id, .. }
            | Self::UserDisliked { user_id, .. }
            | Self::UserPurchased { user_id, .. } => Some(user_id.to_string()),
            Self::UserCreated { user } => Some(user.id.to_string()),
            Self::UserUpdated { user } => Some(user.id.to_string()),
            Self::ProductCreated { product } | Self::ProductUpdated { product } => {
                Some(product.id.to_string())
            }
            Self::ProductDeleted { product_id } => Some(product_id.to_string()),
            Self::RecommendationCreated { recommendation } => {
                Some(recommendation.user_id.to_string())
            }
            Self::Unrecognized { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    #[test]
    fn decodes_interaction_events() {
        let event =
            DomainEvent::decode(br#"{"event":"user_purchased","user_id":3,"product_id":9}"#)
                .unwrap();
        assert_eq!(event.interaction(), Some((Interaction::Purchase, 3, 9)));
        assert_eq!(event.partition_key().as_deref(), Some("3"));
    }

    #[test]
    fn unknown_kind_is_unrecognized() {
        let event = DomainEvent::decode(br#"{"event":"inventory_synced","sku":"x"}"#).unwrap();
        assert_eq!(
            event,
            DomainEvent::Unrecognized {
                kind: "inventory_synced".to_string()
            }
        );
        assert_eq!(event.kind(), "inventory_synced");
        assert!(event.interaction().is_none());
    }

    #[test]
    fn missing_ids_are_malformed() {
        let err = DomainEvent::decode(br#"{"event":"user_liked","user_id":1}"#).unwrap_err();
        assert!(matches!(err, EventDecodeError::Malformed { ref kind, .. } if kind == "user_liked"));

        let err =
            DomainEvent::decode(br#"{"event":"user_disliked","user_id":"1","product_id":2}"#)
                .unwrap_err();
        assert!(matches!(err, EventDecodeError::Malformed { .. }));
    }

    #[test]
    fn missing_kind_and_garbage() {
        assert_eq!(
            DomainEvent::decode(br#"{"user_id":1}"#).unwrap_err(),
            EventDecodeError::MissingKind
        );
        assert_eq!(
            DomainEvent::decode(br#"{"event":17}"#).unwrap_err(),
            EventDecodeError::MissingKind
        );
        assert!(matches!(
            DomainEvent::decode(b"not json").unwrap_err(),
            EventDecodeError::InvalidJson(_)
        ));
    }

    #[test]
    fn encodes_with_event_tag() {
        let event = DomainEvent::RecommendationCreated {
            recommendation: Recommendation {
                id: 1,
                user_id: 5,
                product_ids: vec![42],
                created_at: Utc::now(),
            },
        };
        let value: serde_json::Value = serde_json::from_slice(&event.encode().unwrap()).unwrap();
        assert_eq!(value["event"], "recommendation_created");
        assert_eq!(value["recommendation"]["user_id"], 5);
        assert_eq!(value["recommendation"]["product_ids"][0], 42);
    }

    #[test]
    fn user_created_keeps_summary_fields() {
        let payload = br#"{"event":"user_created","user":{"id":4,"name":"Ada","email":"ada@example.com"}}"#;
        let event = DomainEvent::decode(payload).unwrap();
        let DomainEvent::UserCreated { user } = event else {
            panic!("expected user_created");
        };
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn unrecognized_cannot_be_encoded() {
        let event = DomainEvent::Unrecognized {
            kind: "x".to_string(),
        };
        assert!(matches!(event.encode(), Err(EventDecodeError::Encode { .. })));
    }

    proptest! {
        #[test]
        fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = DomainEvent::decode(&bytes);
        }

        #[test]
        fn any_unknown_kind_is_ignorable(kind in "[a-z_]{1,24}") {
            prop_assume!(!KNOWN_KINDS.contains(&kind.as_str()));
            let payload = serde_json::json!({ "event": kind.clone(), "user_id": 1 });
            let decoded = DomainEvent::decode(payload.to_string().as_bytes()).unwrap();
            prop_assert_eq!(decoded, DomainEvent::Unrecognized { kind });
        }
    }
}
