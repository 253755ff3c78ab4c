//! Records owned by each domain.
//!
//! Identifiers are 64-bit integers assigned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identifier.
pub type UserId = i64;

/// Product identifier.
pub type ProductId = i64;

/// Public user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Minimal user view carried by `user_created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User id
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

/// Mutable profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    /// New display name
    pub name: String,
    /// New email address
    pub email: String,
}

/// Identity record with the stored password hash.
///
/// The hash never leaves the identity service: it is skipped on serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User id
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Salted password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Summary view used in `user_created` events.
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Data required to register a new identity.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Salted password hash
    pub password_hash: String,
}

/// Catalogue product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product id
    pub id: ProductId,
    /// Product name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Category used for preference scoring
    pub category: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Writable product fields (create and update).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    /// Product name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Category
    pub category: String,
}

/// Product with its interactions, as returned by the detailed read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    /// The product itself
    #[serde(flatten)]
    pub product: Product,
    /// Likes on the product
    pub likes: Vec<Like>,
    /// Dislikes on the product
    pub dislikes: Vec<Dislike>,
    /// Number of purchases
    pub purchase_count: i64,
}

/// A user liking a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    /// Record id
    pub id: i64,
    /// Who liked
    pub user_id: UserId,
    /// What was liked
    pub product_id: ProductId,
    /// When
    pub liked_at: DateTime<Utc>,
}

/// A user disliking a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dislike {
    /// Record id
    pub id: i64,
    /// Who disliked
    pub user_id: UserId,
    /// What was disliked
    pub product_id: ProductId,
    /// When
    pub disliked_at: DateTime<Utc>,
}

/// A user purchasing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Record id
    pub id: i64,
    /// Buyer
    pub user_id: UserId,
    /// Product bought
    pub product_id: ProductId,
    /// When
    pub purchased_at: DateTime<Utc>,
}

/// Everything a user did, optionally restricted to one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActions {
    /// Likes
    pub likes: Vec<Like>,
    /// Dislikes
    pub dislikes: Vec<Dislike>,
    /// Purchases
    pub purchases: Vec<Purchase>,
}

/// Kind of user/product interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interaction {
    /// `user_liked`
    Like,
    /// `user_disliked`
    Dislike,
    /// `user_purchased`
    Purchase,
}

/// Immutable recommendation snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Snapshot id
    pub id: i64,
    /// User the snapshot belongs to
    pub user_id: UserId,
    /// Recommended products
    pub product_ids: Vec<ProductId>,
    /// When the snapshot was recorded
    pub created_at: DateTime<Utc>,
}

/// Per-product interaction counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAnalytics {
    /// Product id
    pub product_id: ProductId,
    /// Like count
    pub likes: i64,
    /// Dislike count
    pub dislikes: i64,
    /// Purchase count
    pub purchases: i64,
    /// Last increment
    pub updated_at: DateTime<Utc>,
}

/// Per-user interaction counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnalytics {
    /// User id
    pub user_id: UserId,
    /// Like count
    pub total_likes: i64,
    /// Dislike count
    pub total_dislikes: i64,
    /// Purchase count
    pub total_purchases: i64,
    /// Last increment
    pub updated_at: DateTime<Utc>,
}

/// Limit/offset window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum rows
    pub limit: i64,
    /// Rows to skip
    pub offset: i64,
}

impl Page {
    /// Window for a 1-based page number.
    ///
    /// Values are expected to be validated by the caller (`page >= 1`,
    /// `1 <= page_size <= 100`); out-of-range input is clamped.
    #[must_use]
    pub fn numbered(page: u32, page_size: u32) -> Self {
        let page = i64::from(page.max(1));
        let size = i64::from(page_size.max(1));
        Self {
            limit: size,
            offset: (page - 1) * size,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::numbered(1, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_page_offsets() {
        assert_eq!(Page::numbered(1, 10), Page { limit: 10, offset: 0 });
        assert_eq!(Page::numbered(3, 25), Page { limit: 25, offset: 50 });
        assert_eq!(Page::numbered(0, 0), Page { limit: 1, offset: 0 });
    }

    #[test]
    fn identity_hash_is_not_serialized() {
        let identity = Identity {
            id: 7,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "secret".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&identity).unwrap_or_default();
        assert!(!json.contains("secret"));
        assert!(json.contains("ada@example.com"));
    }

    #[test]
    fn product_details_flatten_product_fields() {
        let now = Utc::now();
        let details = ProductDetails {
            product: Product {
                id: 1,
                name: "Dune".to_string(),
                description: String::new(),
                price: 9.5,
                category: "books".to_string(),
                created_at: now,
                updated_at: now,
            },
            likes: vec![],
            dislikes: vec![],
            purchase_count: 3,
        };
        let value = serde_json::to_value(&details).unwrap_or_default();
        assert_eq!(value["category"], "books");
        assert_eq!(value["purchase_count"], 3);
    }
}
