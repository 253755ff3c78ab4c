//! Repository ports.
//!
//! Each domain owns writes to its own tables through exactly one of these
//! traits. Cross-domain effects never call another domain's repository; they
//! travel as [`DomainEvent`](crate::event::DomainEvent)s.
//!
//! Implementations must make the aggregate mutators atomic on their own:
//! counter and score increments are single upserts, and like/dislike run the
//! retract-check-insert sequence as one unit.

use crate::error::RepositoryResult;
use crate::model::{
    Dislike, Identity, Interaction, Like, NewIdentity, Page, Product, ProductAnalytics,
    ProductDetails, ProductId, ProductInput, Purchase, Recommendation, User, UserActions,
    UserAnalytics, UserId, UserUpdate,
};
use async_trait::async_trait;

/// Users, their interactions, and purchases.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch one user.
    async fn get_user(&self, id: UserId) -> RepositoryResult<User>;

    /// Overwrite name and email.
    async fn update_user(&self, id: UserId, update: &UserUpdate) -> RepositoryResult<User>;

    /// Users ordered by id.
    async fn list_users(&self, page: Page) -> RepositoryResult<Vec<User>>;

    /// Retract any dislike, then record a like.
    ///
    /// Fails with `Conflict` if the like already exists; the retraction is
    /// rolled back in that case.
    async fn like_product(&self, user_id: UserId, product_id: ProductId) -> RepositoryResult<Like>;

    /// Retract any like, then record a dislike. Mirrors
    /// [`like_product`](Self::like_product).
    async fn dislike_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> RepositoryResult<Dislike>;

    /// Record a purchase.
    async fn create_purchase(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> RepositoryResult<Purchase>;

    /// Likes, dislikes and purchases of a user, optionally for one product.
    async fn user_actions(
        &self,
        user_id: UserId,
        product_id: Option<ProductId>,
    ) -> RepositoryResult<UserActions>;

    /// Purchases of a user, newest first.
    async fn purchases(&self, user_id: UserId, page: Page) -> RepositoryResult<Vec<Purchase>>;
}

/// Product catalogue.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product.
    async fn create_product(&self, input: &ProductInput) -> RepositoryResult<Product>;

    /// Product with likes, dislikes and purchase count.
    async fn get_product(&self, id: ProductId) -> RepositoryResult<ProductDetails>;

    /// Overwrite a product's writable fields.
    async fn update_product(&self, id: ProductId, input: &ProductInput)
    -> RepositoryResult<Product>;

    /// Products ordered by id.
    async fn list_products(&self, page: Page) -> RepositoryResult<Vec<Product>>;

    /// Remove a product. Removing a missing product is `NotFound`.
    async fn delete_product(&self, id: ProductId) -> RepositoryResult<()>;
}

/// Preference scores, ranking, and recommendation snapshots.
#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    /// Category of a product (read-only view of the catalogue).
    async fn product_category(&self, product_id: ProductId) -> RepositoryResult<String>;

    /// Add `delta` to the (user, category) score, creating it at `delta`.
    async fn add_category_score(
        &self,
        user_id: UserId,
        category: &str,
        delta: f64,
    ) -> RepositoryResult<()>;

    /// Products in the user's top 10 categories, most recently updated first.
    ///
    /// Empty when the user has no scored categories.
    async fn top_products_by_preference(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> RepositoryResult<Vec<ProductId>>;

    /// Record a snapshot.
    async fn create_recommendation(
        &self,
        user_id: UserId,
        product_ids: &[ProductId],
    ) -> RepositoryResult<Recommendation>;

    /// Snapshots of a user, newest first.
    async fn recommendations_for_user(
        &self,
        user_id: UserId,
    ) -> RepositoryResult<Vec<Recommendation>>;
}

/// Interaction counters.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Increment the product-side counter for `interaction`.
    async fn increment_product(
        &self,
        product_id: ProductId,
        interaction: Interaction,
    ) -> RepositoryResult<()>;

    /// Increment the user-side counter for `interaction`.
    async fn increment_user(&self, user_id: UserId, interaction: Interaction)
    -> RepositoryResult<()>;

    /// Counters of a product.
    async fn product_analytics(&self, product_id: ProductId) -> RepositoryResult<ProductAnalytics>;

    /// Counters of a user.
    async fn user_analytics(&self, user_id: UserId) -> RepositoryResult<UserAnalytics>;
}

/// Credentials store.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Insert an identity. A taken email is `Conflict`.
    async fn create_identity(&self, identity: &NewIdentity) -> RepositoryResult<Identity>;

    /// Look up by email.
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Identity>>;
}
