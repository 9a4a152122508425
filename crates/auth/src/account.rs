//! Account records as seen by the authentication core.
//!
//! The account store owns these records; the core only reads them and asks
//! the store for single-record updates.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keygate_core::{AccountId, Email, Entity};

use crate::{PasswordDigest, Role};

// ─────────────────────────────────────────────────────────────────────────────
// Account Status
// ─────────────────────────────────────────────────────────────────────────────

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Account may authenticate.
    #[default]
    Active,
    /// Account is blocked from every protected request.
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }
}

impl core::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            other => Err(format!("unknown account status '{other}'")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Account
// ─────────────────────────────────────────────────────────────────────────────

/// A stored account.
///
/// # Invariants
/// - `email` is unique across the directory (enforced by the store at write time).
/// - `password_hash` is never the plaintext secret and never leaves the process;
///   this type deliberately does not implement `Serialize`. Use [`Account::view`]
///   for anything that goes over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub full_name: String,
    pub password_hash: PasswordDigest,
    pub role: Role,
    pub status: AccountStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Outward projection without credential material.
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            status: self.status,
            last_login: self.last_login,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input for creating an account; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: Email,
    pub full_name: String,
    pub password_hash: PasswordDigest,
    pub role: Role,
    pub status: AccountStatus,
}

impl NewAccount {
    /// New accounts start `active`.
    pub fn new(email: Email, full_name: impl Into<String>, password_hash: PasswordDigest, role: Role) -> Self {
        Self {
            email,
            full_name: full_name.into(),
            password_hash,
            role,
            status: AccountStatus::Active,
        }
    }

    pub fn into_account(self, id: AccountId, now: DateTime<Utc>) -> Account {
        Account {
            id,
            email: self.email,
            full_name: self.full_name,
            password_hash: self.password_hash,
            role: self.role,
            status: self.status,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Profile fields an account holder may change about themselves.
///
/// Role and status are absent on purpose: those only move through privileged paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: Option<Email>,
    pub full_name: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.full_name.is_none()
    }

    pub fn apply_to(&self, account: &mut Account, now: DateTime<Utc>) {
        if let Some(email) = &self.email {
            account.email = email.clone();
        }
        if let Some(full_name) = &self.full_name {
            account.full_name = full_name.clone();
        }
        account.updated_at = now;
    }
}

/// Serializable account representation for responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: AccountId,
    pub email: Email,
    pub full_name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        NewAccount::new(
            Email::parse("alice@example.com").unwrap(),
            "Alice Smith",
            PasswordDigest::from_stored("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"),
            Role::User,
        )
        .into_account(AccountId::new(), Utc::now())
    }

    #[test]
    fn new_accounts_are_active_without_last_login() {
        let account = sample();
        assert!(account.is_active());
        assert!(account.last_login.is_none());
        assert_eq!(account.created_at, account.updated_at);
    }

    #[test]
    fn view_never_carries_the_password_hash() {
        let json = serde_json::to_value(sample().view()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.keys().all(|k| !k.to_lowercase().contains("password")));
        assert_eq!(obj["fullName"], "Alice Smith");
        assert_eq!(obj["status"], "active");
        assert_eq!(obj["role"], "user");
        assert!(obj["lastLogin"].is_null());
    }

    #[test]
    fn profile_update_touches_only_given_fields() {
        let mut account = sample();
        let update = ProfileUpdate {
            email: None,
            full_name: Some("Alice Jones".to_string()),
        };
        update.apply_to(&mut account, Utc::now());
        assert_eq!(account.full_name, "Alice Jones");
        assert_eq!(account.email.as_str(), "alice@example.com");
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn status_parses_from_wire_names() {
        assert_eq!("inactive".parse::<AccountStatus>().unwrap(), AccountStatus::Inactive);
        assert!("suspended".parse::<AccountStatus>().is_err());
    }
}
