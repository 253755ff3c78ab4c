//! HS256 session tokens.

use crate::error::{Result, ServiceError};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use recsys_core::environment::Clock;
use recsys_core::model::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Issues and verifies session tokens with a shared secret.
///
/// Expiry is checked against the injected [`Clock`], not the system time, so
/// tests can pin time.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] if `secret` is empty.
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        if secret.is_empty() {
            return Err(ServiceError::Validation("JWT secret must not be empty".to_string()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            clock,
        })
    }

    /// Sign a token for `user_id`, valid for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Infrastructure`] if signing fails.
    pub fn issue(&self, user_id: UserId) -> Result<String> {
        let now = self.clock.now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::Infrastructure(format!("failed to sign token: {e}")))
    }

    /// Check signature and expiry and return the subject.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidCredentials`] for a bad signature, an
    /// expired token, or a subject that is not a user id.
    pub fn verify(&self, token: &str) -> Result<UserId> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                ServiceError::InvalidCredentials
            })?
            .claims;

        if claims.exp <= self.clock.now().timestamp() {
            tracing::debug!(sub = %claims.sub, "Token expired");
            return Err(ServiceError::InvalidCredentials);
        }

        claims
            .sub
            .parse()
            .map_err(|_| ServiceError::InvalidCredentials)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    struct SettableClock(Mutex<DateTime<Utc>>);

    impl SettableClock {
        fn at(time: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(time)))
        }

        fn set(&self, time: DateTime<Utc>) {
            *self.0.lock().unwrap() = time;
        }
    }

    impl Clock for SettableClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn issuer(secret: &[u8], clock: Arc<SettableClock>) -> TokenIssuer {
        TokenIssuer::new(secret, Duration::from_secs(60), clock).unwrap()
    }

    #[test]
    fn issued_token_verifies_to_subject() {
        let issuer = issuer(b"secret", SettableClock::at(Utc::now()));
        let token = issuer.issue(42).unwrap();
        assert_eq!(issuer.verify(&token), Ok(42));
    }

    #[test]
    fn expired_token_is_rejected() {
        let start = Utc::now();
        let clock = SettableClock::at(start);
        let issuer = issuer(b"secret", Arc::clone(&clock));
        let token = issuer.issue(42).unwrap();

        clock.set(start + chrono::Duration::seconds(61));
        assert_eq!(issuer.verify(&token), Err(ServiceError::InvalidCredentials));
    }

    #[test]
    fn foreign_or_garbled_tokens_are_rejected() {
        let clock = SettableClock::at(Utc::now());
        let ours = issuer(b"secret", Arc::clone(&clock));
        let theirs = issuer(b"other", clock);

        let token = theirs.issue(42).unwrap();
        assert_eq!(ours.verify(&token), Err(ServiceError::InvalidCredentials));
        assert_eq!(ours.verify("garbage"), Err(ServiceError::InvalidCredentials));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            TokenIssuer::new(b"", Duration::from_secs(60), SettableClock::at(Utc::now())),
            Err(ServiceError::Validation(_))
        ));
    }
}
