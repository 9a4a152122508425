//! Password hashing and verification.
//!
//! Argon2id in PHC string format; every hash carries its own random salt and
//! parameters, so stored digests stay verifiable if the defaults change later.
//! Plaintext shape (length, character classes) is a boundary concern and is not
//! checked here.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// A stored password digest (PHC string).
///
/// `Debug` is redacted so digests cannot end up in logs via `{:?}`.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap a digest loaded from storage. No parsing happens here: a malformed
    /// value simply never verifies.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Hash a secret with a fresh salt.
pub fn hash_password(secret: &str) -> Result<PasswordDigest, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let phc = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hashing(e.to_string()))?
        .to_string();

    Ok(PasswordDigest(phc))
}

/// Verify a secret against a stored digest.
///
/// Returns `false` for a mismatch and for an unparseable digest alike, so a
/// caller cannot tell a corrupt record from a wrong password. The digest
/// comparison inside `argon2` is constant-time.
pub fn verify_password(secret: &str, digest: &PasswordDigest) -> bool {
    match PasswordHash::new(digest.as_str()) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
