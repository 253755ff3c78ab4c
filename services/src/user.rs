//! User profiles and interactions.

use crate::config::CacheConfig;
use crate::effects;
use crate::error::Result;
use recsys_core::cache::{Cache, keys};
use recsys_core::event::DomainEvent;
use recsys_core::event_bus::EventBus;
use recsys_core::model::{
    Dislike, Like, Page, ProductId, Purchase, User, UserActions, UserId, UserUpdate,
};
use recsys_core::ports::UserRepository;
use recsys_core::topic::Topic;
use std::sync::Arc;
use tracing::{info, instrument};

const CACHE_FAMILY: &str = "user";

/// User service: profiles behind `user:<id>`, interactions published on
/// `user_updates`.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn Cache>,
    event_bus: Arc<dyn EventBus>,
    cache_config: CacheConfig,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn Cache>,
        event_bus: Arc<dyn EventBus>,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            users,
            cache,
            event_bus,
            cache_config,
        }
    }

    /// Read-through profile lookup.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Infrastructure` if the store fails.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: UserId) -> Result<User> {
        let key = keys::user(id);
        if let Some(user) = effects::cached(self.cache.as_ref(), CACHE_FAMILY, &key).await {
            return Ok(user);
        }

        let user = self.users.get_user(id).await?;
        effects::fill(self.cache.as_ref(), &key, &user, self.cache_config.user_ttl).await;
        Ok(user)
    }

    /// Overwrite name and email, drop the cached profile, publish
    /// `user_updated`.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Conflict` (email in use), or `Infrastructure`.
    #[instrument(skip(self, update))]
    pub async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User> {
        let user = self.users.update_user(id, update).await?;
        effects::invalidate(self.cache.as_ref(), &keys::user(id)).await;
        effects::publish(
            self.event_bus.as_ref(),
            Topic::UserUpdates,
            &DomainEvent::UserUpdated { user: user.clone() },
        )
        .await;
        info!(user_id = id, "User updated");
        Ok(user)
    }

    /// Users ordered by id.
    ///
    /// # Errors
    ///
    /// `Infrastructure` if the store fails.
    pub async fn list_users(&self, page: Page) -> Result<Vec<User>> {
        Ok(self.users.list_users(page).await?)
    }

    /// Record a like (retracting any dislike) and publish `user_liked`.
    ///
    /// # Errors
    ///
    /// `Conflict` if the like already exists, `Infrastructure` otherwise.
    #[instrument(skip(self))]
    pub async fn like_product(&self, user_id: UserId, product_id: ProductId) -> Result<Like> {
        let like = self.users.like_product(user_id, product_id).await?;
        effects::publish(
            self.event_bus.as_ref(),
            Topic::UserUpdates,
            &DomainEvent::UserLiked {
                user_id,
                product_id,
                like: Some(like.clone()),
            },
        )
        .await;
        info!("Product liked");
        Ok(like)
    }

    /// Record a dislike (retracting any like) and publish `user_disliked`.
    ///
    /// # Errors
    ///
    /// `Conflict` if the dislike already exists, `Infrastructure` otherwise.
    #[instrument(skip(self))]
    pub async fn dislike_product(&self, user_id: UserId, product_id: ProductId) -> Result<Dislike> {
        let dislike = self.users.dislike_product(user_id, product_id).await?;
        effects::publish(
            self.event_bus.as_ref(),
            Topic::UserUpdates,
            &DomainEvent::UserDisliked {
                user_id,
                product_id,
                dislike: Some(dislike.clone()),
            },
        )
        .await;
        info!("Product disliked");
        Ok(dislike)
    }

    /// Record a purchase and publish `user_purchased`.
    ///
    /// # Errors
    ///
    /// `Infrastructure` if the store fails.
    #[instrument(skip(self))]
    pub async fn purchase_product(&self, user_id: UserId, product_id: ProductId) -> Result<Purchase> {
        let purchase = self.users.create_purchase(user_id, product_id).await?;
        effects::publish(
            self.event_bus.as_ref(),
            Topic::UserUpdates,
            &DomainEvent::UserPurchased {
                user_id,
                product_id,
                purchase: Some(purchase.clone()),
            },
        )
        .await;
        info!("Product purchased");
        Ok(purchase)
    }

    /// Everything the user did, optionally for one product.
    ///
    /// # Errors
    ///
    /// `Infrastructure` if the store fails.
    pub async fn get_user_actions(
        &self,
        user_id: UserId,
        product_id: Option<ProductId>,
    ) -> Result<UserActions> {
        Ok(self.users.user_actions(user_id, product_id).await?)
    }

    /// Purchases of a user, newest first.
    ///
    /// # Errors
    ///
    /// `Infrastructure` if the store fails.
    pub async fn get_user_purchases(&self, user_id: UserId, page: Page) -> Result<Vec<Purchase>> {
        Ok(self.users.purchases(user_id, page).await?)
    }
}
