//! `keygate-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: the account
//! store is consumed through the [`AccountDirectory`] trait and every gate
//! returns a typed result for the transport layer to map.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod directory;
pub mod gate;
pub mod lifecycle;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;

pub use account::{Account, AccountStatus, AccountView, NewAccount, ProfileUpdate};
pub use authorize::{authorize, AuthzError};
pub use claims::{validate_claims, TokenClaims, TokenValidationError};
pub use credentials::{rotate_password, verify_login, CredentialError};
pub use directory::{AccountDirectory, AccountPage, AccountQuery, DirectoryError, Pagination};
pub use gate::{authenticate, extract_bearer, AuthnError};
pub use lifecycle::{activate, deactivate, LifecycleError, StatusChange};
pub use password::{hash_password, verify_password, PasswordDigest, PasswordError};
pub use principal::Principal;
pub use roles::Role;
pub use token::{IssuedToken, SigningKey, SigningKeyError, TokenError, TokenService, TokenValidator};
