use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use keygate_core::AccountId;

use crate::Role;

/// Identity token claims (transport-agnostic).
///
/// This is the full set of claims a token carries once its signature has been
/// verified. Account status is intentionally absent: it is re-read from the
/// account directory on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject / account identifier.
    pub sub: AccountId,

    /// Role at issuance time.
    pub role: Role,

    /// Unique token id (UUIDv7, so also time-ordered).
    pub jti: Uuid,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate the claims' time window.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`crate::TokenService`] before this is called.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn claims_at(issued_at: DateTime<Utc>, ttl: Duration) -> TokenClaims {
        TokenClaims {
            sub: AccountId::new(),
            role: Role::User,
            jti: Uuid::now_v7(),
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    #[test]
    fn inside_window_is_valid() {
        let now = Utc::now();
        let claims = claims_at(now, Duration::hours(24));
        assert_eq!(validate_claims(&claims, now), Ok(()));
        assert_eq!(validate_claims(&claims, now + Duration::hours(23)), Ok(()));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let claims = claims_at(now, Duration::hours(1));
        assert_eq!(
            validate_claims(&claims, claims.expires_at),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn future_issue_and_inverted_window_are_rejected() {
        let now = Utc::now();
        let future = claims_at(now + Duration::minutes(5), Duration::hours(1));
        assert_eq!(validate_claims(&future, now), Err(TokenValidationError::NotYetValid));

        let inverted = claims_at(now, Duration::seconds(0));
        assert_eq!(
            validate_claims(&inverted, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any positive window, a check at `issued_at + offset` is
        /// valid exactly when `offset < ttl`.
        #[test]
        fn validity_matches_offset(ttl_secs in 1i64..200_000, offset_secs in 0i64..400_000) {
            let issued_at = Utc::now();
            let claims = claims_at(issued_at, Duration::seconds(ttl_secs));
            let result = validate_claims(&claims, issued_at + Duration::seconds(offset_secs));
            if offset_secs < ttl_secs {
                prop_assert_eq!(result, Ok(()));
            } else {
                prop_assert_eq!(result, Err(TokenValidationError::Expired));
            }
        }
    }
}
