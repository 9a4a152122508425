//! Account directory boundary.
//!
//! The persistent account store is an external collaborator: the core only
//! depends on this trait. Implementations must make each mutating call a
//! single atomic update of one record and must enforce email uniqueness at
//! write time.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use keygate_core::{AccountId, Email};

use crate::{Account, AccountStatus, NewAccount, PasswordDigest, ProfileUpdate, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Another account already holds this email.
    #[error("email already registered: {0}")]
    Conflict(Email),

    #[error("account not found")]
    NotFound,

    /// Storage failure; details are for server-side logs only.
    #[error("directory backend error: {0}")]
    Backend(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Listing
// ─────────────────────────────────────────────────────────────────────────────

/// Filter + page request for account listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountQuery {
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive substring over email and full name.
    pub search: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
}

impl AccountQuery {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Normalize raw paging input: zero/absent page becomes 1, zero/absent
    /// limit becomes the default, oversized limits are clamped.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT);

        Self {
            page,
            limit,
            search: None,
            role: None,
            status: None,
        }
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn with_role(mut self, role: Option<Role>) -> Self {
        self.role = role;
        self
    }

    pub fn with_status(mut self, status: Option<AccountStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Whether `account` passes the filters (paging aside).
    pub fn matches(&self, account: &Account) -> bool {
        if self.role.is_some_and(|r| r != account.role) {
            return false;
        }
        if self.status.is_some_and(|s| s != account.status) {
            return false;
        }
        match &self.search {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                account.email.as_str().contains(&needle)
                    || account.full_name.to_lowercase().contains(&needle)
            }
        }
    }
}

impl Default for AccountQuery {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_users: u64,
    pub users_per_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    pub pagination: Pagination,
}

impl AccountPage {
    pub fn new(accounts: Vec<Account>, total: u64, query: &AccountQuery) -> Self {
        let limit = u64::from(query.limit.max(1));
        Self {
            accounts,
            pagination: Pagination {
                current_page: query.page,
                total_pages: total.div_ceil(limit),
                total_users: total,
                users_per_page: query.limit,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory Contract
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Create an account; fails with `Conflict` if the email is taken.
    async fn insert(&self, account: NewAccount) -> Result<Account, DirectoryError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, DirectoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, DirectoryError>;

    /// Apply a profile change; `Conflict` if the new email belongs to another account.
    async fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> Result<Account, DirectoryError>;

    async fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<Account, DirectoryError>;

    async fn set_password_hash(&self, id: AccountId, hash: PasswordDigest) -> Result<(), DirectoryError>;

    async fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> Result<Account, DirectoryError>;

    /// Filtered page, newest accounts first.
    async fn list(&self, query: &AccountQuery) -> Result<AccountPage, DirectoryError>;
}

#[async_trait]
impl<D> AccountDirectory for Arc<D>
where
    D: AccountDirectory + ?Sized,
{
    async fn insert(&self, account: NewAccount) -> Result<Account, DirectoryError> {
        (**self).insert(account).await
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, DirectoryError> {
        (**self).find_by_id(id).await
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, DirectoryError> {
        (**self).find_by_email(email).await
    }

    async fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> Result<Account, DirectoryError> {
        (**self).update_profile(id, update).await
    }

    async fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<Account, DirectoryError> {
        (**self).set_status(id, status).await
    }

    async fn set_password_hash(&self, id: AccountId, hash: PasswordDigest) -> Result<(), DirectoryError> {
        (**self).set_password_hash(id, hash).await
    }

    async fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> Result<Account, DirectoryError> {
        (**self).record_login(id, at).await
    }

    async fn list(&self, query: &AccountQuery) -> Result<AccountPage, DirectoryError> {
        (**self).list(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(email: &str, name: &str, role: Role, status: AccountStatus) -> Account {
        let mut new = NewAccount::new(
            Email::parse(email).unwrap(),
            name,
            PasswordDigest::from_stored("x"),
            role,
        );
        new.status = status;
        new.into_account(AccountId::new(), Utc::now())
    }

    #[test]
    fn paging_input_is_normalized() {
        let q = AccountQuery::new(Some(0), Some(0));
        assert_eq!((q.page, q.limit), (1, AccountQuery::DEFAULT_LIMIT));

        let q = AccountQuery::new(Some(3), Some(10_000));
        assert_eq!((q.page, q.limit), (3, AccountQuery::MAX_LIMIT));
        assert_eq!(q.offset(), 200);
    }

    #[test]
    fn filters_combine() {
        let alice = account("alice@example.com", "Alice Smith", Role::Admin, AccountStatus::Active);
        let bob = account("bob@example.com", "Bob Jones", Role::User, AccountStatus::Inactive);

        let q = AccountQuery::default().with_search(Some("SMITH".to_string()));
        assert!(q.matches(&alice));
        assert!(!q.matches(&bob));

        let q = AccountQuery::default().with_status(Some(AccountStatus::Inactive));
        assert!(!q.matches(&alice));
        assert!(q.matches(&bob));

        let q = AccountQuery::default()
            .with_role(Some(Role::User))
            .with_search(Some("bob@".to_string()));
        assert!(q.matches(&bob));
        assert!(!q.matches(&alice));
    }

    #[test]
    fn blank_search_is_ignored() {
        let q = AccountQuery::default().with_search(Some("   ".to_string()));
        assert!(q.search.is_none());
    }

    #[test]
    fn page_metadata_rounds_up() {
        let q = AccountQuery::new(Some(1), Some(10));
        let page = AccountPage::new(Vec::new(), 16, &q);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.pagination.total_users, 16);

        let empty = AccountPage::new(Vec::new(), 0, &q);
        assert_eq!(empty.pagination.total_pages, 0);
    }
}
