//! Signed, time-bounded identity tokens (HS256 JWT).
//!
//! The signing key is process-wide configuration: it is loaded once at startup,
//! handed to [`TokenService::new`], and never mutated afterwards, so a single
//! service can be shared behind an `Arc` by every concurrent verification.
//! Key rotation would mean accepting a set of decoding keys; not supported yet.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use keygate_core::AccountId;

use crate::claims::{validate_claims, TokenClaims, TokenValidationError};
use crate::Role;

/// Default validity window for issued tokens.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Longest accepted validity window (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Shortest accepted HMAC secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigningKeyError {
    #[error("signing secret must be at least {min} bytes (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("token lifetime must be positive")]
    NonPositiveTtl,

    #[error("token lifetime must not exceed {max_hours} hours")]
    TtlTooLong { max_hours: i64 },
}

/// Token verification/issuance failures.
///
/// `Expired` is kept apart from `Invalid` so callers *can* differentiate; the
/// authentication gate collapses both into one outward failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                TokenError::Invalid
            }
        }
    }
}

/// HMAC secret for signing tokens. `Debug` never prints the bytes.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, SigningKeyError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(SigningKeyError::TooShort {
                min: MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }
        Ok(Self(secret))
    }
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SigningKey(<{} bytes redacted>)", self.0.len())
    }
}

/// Validates a presented token and returns its claims.
///
/// The authentication gate depends on this seam rather than on the concrete
/// service, so tests (and future key-rotation schemes) can plug in.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError>;
}

/// A freshly issued token plus its expiry, for responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256-signed identity tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(key: SigningKey, ttl: Duration) -> Result<Self, SigningKeyError> {
        if ttl <= Duration::zero() {
            return Err(SigningKeyError::NonPositiveTtl);
        }
        if ttl > Duration::hours(MAX_TOKEN_TTL_HOURS) {
            return Err(SigningKeyError::TtlTooLong {
                max_hours: MAX_TOKEN_TTL_HOURS,
            });
        }

        // Time-window checks are done by `validate_claims` against our own
        // RFC 3339 claims, so the library only checks algorithm and signature.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(&key.0),
            decoding: DecodingKey::from_secret(&key.0),
            validation,
            ttl,
        })
    }

    pub fn issue(&self, account_id: AccountId, role: Role) -> Result<IssuedToken, TokenError> {
        self.issue_at(account_id, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        account_id: AccountId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;

        let claims = TokenClaims {
            sub: account_id,
            role,
            jti: Uuid::now_v7(),
            issued_at: now,
            expires_at,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl TokenValidator for TokenService {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, now)
    }
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &"HS256")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-test-secret-test-secret";

    fn service() -> TokenService {
        TokenService::new(SigningKey::new(SECRET).unwrap(), Duration::hours(24)).unwrap()
    }

    #[test]
    fn issued_token_verifies_to_same_subject_and_role() {
        let svc = service();
        let id = AccountId::new();
        let issued = svc.issue(id, Role::Admin).unwrap();

        let claims = svc.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.expires_at, issued.expires_at);
        assert_eq!(claims.expires_at - claims.issued_at, Duration::hours(24));
    }

    #[test]
    fn two_tokens_for_same_account_differ() {
        let svc = service();
        let id = AccountId::new();
        let now = Utc::now();
        let a = svc.issue_at(id, Role::User, now).unwrap();
        let b = svc.issue_at(id, Role::User, now).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn expired_token_is_distinguished_from_invalid() {
        let svc = service();
        let issued_at = Utc::now() - Duration::hours(25);
        let issued = svc.issue_at(AccountId::new(), Role::User, issued_at).unwrap();
        assert_eq!(svc.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn token_from_another_key_is_invalid() {
        let other = TokenService::new(
            SigningKey::new("another-secret-another-secret-000").unwrap(),
            Duration::hours(24),
        )
        .unwrap();
        let issued = other.issue(AccountId::new(), Role::Admin).unwrap();
        assert_eq!(service().verify(&issued.token), Err(TokenError::Invalid));
    }

    #[test]
    fn tampered_or_garbage_tokens_are_invalid() {
        let svc = service();
        let issued = svc.issue(AccountId::new(), Role::User).unwrap();

        let forged_payload = {
            let other = svc.issue(AccountId::new(), Role::Admin).unwrap();
            other.token.split('.').nth(1).unwrap().to_string()
        };
        let mut parts: Vec<&str> = issued.token.split('.').collect();
        parts[1] = &forged_payload;
        let spliced = parts.join(".");

        assert_eq!(svc.verify(&spliced), Err(TokenError::Invalid));
        assert_eq!(svc.verify("not-a-token"), Err(TokenError::Invalid));
        assert_eq!(svc.verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn short_secret_and_zero_ttl_are_rejected() {
        assert_eq!(
            SigningKey::new("short").unwrap_err(),
            SigningKeyError::TooShort { min: MIN_SECRET_LEN, actual: 5 }
        );
        let key = SigningKey::new(SECRET).unwrap();
        assert_eq!(
            TokenService::new(key, Duration::zero()).unwrap_err(),
            SigningKeyError::NonPositiveTtl
        );
    }

    #[test]
    fn oversized_ttl_is_rejected_at_construction() {
        let key = SigningKey::new(SECRET).unwrap();
        let huge = Duration::try_hours(3_000_000_000).unwrap();
        assert_eq!(
            TokenService::new(key.clone(), huge).unwrap_err(),
            SigningKeyError::TtlTooLong { max_hours: MAX_TOKEN_TTL_HOURS }
        );

        let max = TokenService::new(key, Duration::hours(MAX_TOKEN_TTL_HOURS)).unwrap();
        assert!(max.issue(AccountId::new(), Role::User).is_ok());
    }

    #[test]
    fn expiry_overflow_is_an_error_not_a_panic() {
        let svc = service();
        let result = svc.issue_at(AccountId::new(), Role::User, DateTime::<Utc>::MAX_UTC);
        assert!(matches!(result, Err(TokenError::Signing(_))));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let key = SigningKey::new(SECRET).unwrap();
        assert!(!format!("{key:?}").contains("test-secret"));
        assert!(!format!("{:?}", service()).contains("test-secret"));
    }
}
