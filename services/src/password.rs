//! Salted, iterated SHA-256 password hashes.
//!
//! Encoded form: `sha256$<iterations>$<salt>$<digest>`, salt and digest in
//! unpadded standard base64. Verification compares digests in constant time.

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Default work factor.
pub const DEFAULT_ITERATIONS: u32 = 10_000;

/// Hashes and verifies passwords.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: u32,
    /// Hash of a password nobody has, verified against when an email is
    /// unknown so the response takes as long as a real mismatch.
    decoy: String,
}

impl PasswordHasher {
    /// Create a hasher with `iterations` rounds (at least 1).
    #[must_use]
    pub fn new(iterations: u32) -> Self {
        let iterations = iterations.max(1);
        let decoy = encode(iterations, &random_salt(), "decoy password");
        Self { iterations, decoy }
    }

    /// Hash `password` with a fresh random salt.
    #[must_use]
    pub fn hash(&self, password: &str) -> String {
        encode(self.iterations, &random_salt(), password)
    }

    /// Whether `password` matches `encoded`. Malformed hashes never match.
    #[must_use]
    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let Some((iterations, salt, expected)) = decode(encoded) else {
            return false;
        };
        let actual = digest(iterations, &salt, password);
        constant_time_eq::constant_time_eq(&actual, &expected)
    }

    /// Spend the same effort as [`verify`](Self::verify) without a stored hash.
    pub fn verify_decoy(&self, password: &str) {
        let _ = self.verify(password, &self.decoy);
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

fn digest(iterations: u32, salt: &[u8], password: &str) -> Vec<u8> {
    let mut hash = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..iterations {
        hash = Sha256::new()
            .chain_update(hash)
            .chain_update(salt)
            .chain_update(password.as_bytes())
            .finalize();
    }
    hash.to_vec()
}

fn encode(iterations: u32, salt: &[u8], password: &str) -> String {
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(digest(iterations, salt, password))
    )
}

fn decode(encoded: &str) -> Option<(u32, Vec<u8>, Vec<u8>)> {
    let mut parts = encoded.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations: u32 = parts.next()?.parse().ok().filter(|n| *n >= 1)?;
    let salt = STANDARD_NO_PAD.decode(parts.next()?).ok()?;
    let expected = STANDARD_NO_PAD.decode(parts.next()?).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((iterations, salt, expected))
}
