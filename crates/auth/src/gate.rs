//! Authentication gate: bearer token → live, active [`Principal`].
//!
//! Each stage either hands its result to the next or stops with a typed
//! rejection:
//!
//! 1. extract the bearer token            → `MissingCredential`
//! 2. verify signature + time window      → `InvalidCredential`
//! 3. load the referenced account         → `InvalidCredential`
//! 4. require `status == active`          → `AccountInactive`
//! 5. build the principal
//!
//! Step 3 is the only suspending point. The principal is returned by value
//! and only once every stage passed, so a cancelled lookup can never leave a
//! half-built identity behind.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{AccountDirectory, Principal, TokenError, TokenValidator};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthnError {
    #[error("missing bearer credential")]
    MissingCredential,

    /// Bad signature, expired token, or unknown account; intentionally one variant.
    #[error("invalid credential")]
    InvalidCredential,

    #[error("account is inactive")]
    AccountInactive,

    /// The account store failed; not an authentication verdict.
    #[error("account directory unavailable: {0}")]
    Directory(String),
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthnError> {
    let header = header.ok_or(AuthnError::MissingCredential)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthnError::MissingCredential)?
        .trim();

    if token.is_empty() {
        return Err(AuthnError::MissingCredential);
    }

    Ok(token)
}

/// Run the full gate for one request.
pub async fn authenticate<D>(
    authorization: Option<&str>,
    tokens: &dyn TokenValidator,
    directory: &D,
    now: DateTime<Utc>,
) -> Result<Principal, AuthnError>
where
    D: AccountDirectory + ?Sized,
{
    let token = extract_bearer(authorization)?;

    let claims = tokens.validate(token, now).map_err(|e| {
        match e {
            TokenError::Expired => debug!("rejected expired token"),
            _ => debug!("rejected invalid token"),
        }
        AuthnError::InvalidCredential
    })?;

    let account = directory
        .find_by_id(claims.sub)
        .await
        .map_err(|e| AuthnError::Directory(e.to_string()))?
        .ok_or_else(|| {
            warn!(account_id = %claims.sub, "validly signed token for unknown account");
            AuthnError::InvalidCredential
        })?;

    if !account.is_active() {
        debug!(account_id = %account.id, "rejected token for inactive account");
        return Err(AuthnError::AccountInactive);
    }

    Ok(Principal::from_account(&account))
}
