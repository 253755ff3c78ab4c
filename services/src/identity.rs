//! Registration and login.

use crate::effects;
use crate::error::{Result, ServiceError};
use crate::password::PasswordHasher;
use crate::token::TokenIssuer;
use recsys_core::event::DomainEvent;
use recsys_core::event_bus::EventBus;
use recsys_core::model::{NewIdentity, UserId, UserSummary};
use recsys_core::ports::IdentityRepository;
use recsys_core::topic::Topic;
use std::sync::Arc;
use tracing::{info, instrument};

/// Identity service: owns credentials, issues session tokens.
#[derive(Clone)]
pub struct IdentityService {
    identities: Arc<dyn IdentityRepository>,
    event_bus: Arc<dyn EventBus>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl IdentityService {
    /// Create a new identity service.
    #[must_use]
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        event_bus: Arc<dyn EventBus>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            identities,
            event_bus,
            hasher,
            tokens,
        }
    }

    /// Register a user and announce it with `user_created`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] if a field is blank
    /// - [`ServiceError::Conflict`] if the email is taken
    /// - [`ServiceError::Infrastructure`] if the store fails
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<UserSummary> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "name, email and password are required".to_string(),
            ));
        }

        let identity = self
            .identities
            .create_identity(&NewIdentity {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: self.hasher.hash(password),
            })
            .await?;
        let user = identity.summary();

        effects::publish(
            self.event_bus.as_ref(),
            Topic::UserUpdates,
            &DomainEvent::UserCreated { user: user.clone() },
        )
        .await;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and issue a token.
    ///
    /// An unknown email and a wrong password are indistinguishable: both
    /// return [`ServiceError::InvalidCredentials`] after the same hashing work.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidCredentials`] on any credential mismatch
    /// - [`ServiceError::Infrastructure`] if the store fails
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let Some(identity) = self.identities.find_by_email(email).await? else {
            self.hasher.verify_decoy(password);
            info!("Login rejected");
            return Err(ServiceError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &identity.password_hash) {
            info!("Login rejected");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(identity.id)?;
        info!(user_id = identity.id, "User logged in");
        Ok(token)
    }

    /// Resolve a bearer token to its user id.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidCredentials`] for any unusable token.
    pub fn verify_token(&self, token: &str) -> Result<UserId> {
        self.tokens.verify(token)
    }
}
