//! Credential checks shared by the login and password-change flows.

use std::sync::LazyLock;

use thiserror::Error;

use crate::password::{hash_password, verify_password, PasswordDigest};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Same class as a failed login; never says which half was wrong.
    #[error("invalid credential")]
    InvalidCredential,

    #[error("{0}")]
    Hashing(String),
}

/// Digest verified when the login email is unknown, so that path costs one
/// Argon2 verification like every other login attempt.
static DUMMY_DIGEST: LazyLock<Option<PasswordDigest>> =
    LazyLock::new(|| hash_password("keygate-timing-equalizer").ok());

/// Check a login secret against an account's digest, if there is an account.
///
/// `None` (no such account) still spends a full verification and then
/// returns `false`.
pub fn verify_login(secret: &str, stored: Option<&PasswordDigest>) -> bool {
    match stored {
        Some(digest) => verify_password(secret, digest),
        None => {
            if let Some(dummy) = DUMMY_DIGEST.as_ref() {
                let _ = verify_password(secret, dummy);
            }
            false
        }
    }
}

/// Re-verify the current secret and produce the digest for the new one.
///
/// Previously issued tokens are not affected by a rotation; they stay valid
/// until they expire.
pub fn rotate_password(
    current: &str,
    new: &str,
    stored: &PasswordDigest,
) -> Result<PasswordDigest, CredentialError> {
    if !verify_password(current, stored) {
        return Err(CredentialError::InvalidCredential);
    }

    hash_password(new).map_err(|e| CredentialError::Hashing(e.to_string()))
}
