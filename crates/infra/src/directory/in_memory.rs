use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use keygate_auth::{
    Account, AccountDirectory, AccountPage, AccountQuery, AccountStatus, DirectoryError,
    NewAccount, PasswordDigest, ProfileUpdate,
};
use keygate_core::{AccountId, Email, Entity};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    by_email: HashMap<Email, AccountId>,
}

/// In-memory account directory for tests/dev.
///
/// One lock guards both the records and the email index, so every mutation
/// (including the uniqueness check) is atomic.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    inner: RwLock<State>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, DirectoryError> {
        self.inner
            .read()
            .map_err(|_| DirectoryError::Backend("account directory lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, DirectoryError> {
        self.inner
            .write()
            .map_err(|_| DirectoryError::Backend("account directory lock poisoned".to_string()))
    }

    fn update<F>(&self, id: AccountId, f: F) -> Result<Account, DirectoryError>
    where
        F: FnOnce(&mut Account),
    {
        let mut state = self.write()?;
        let account = state.accounts.get_mut(&id).ok_or(DirectoryError::NotFound)?;
        f(account);
        Ok(account.clone())
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn insert(&self, account: NewAccount) -> Result<Account, DirectoryError> {
        let mut state = self.write()?;
        if state.by_email.contains_key(&account.email) {
            return Err(DirectoryError::Conflict(account.email));
        }

        let account = account.into_account(AccountId::new(), Utc::now());
        state.by_email.insert(account.email.clone(), *account.id());
        state.accounts.insert(*account.id(), account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, DirectoryError> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, DirectoryError> {
        let state = self.read()?;
        Ok(state
            .by_email
            .get(email)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> Result<Account, DirectoryError> {
        let mut state = self.write()?;
        let State { accounts, by_email } = &mut *state;

        let account = accounts.get_mut(&id).ok_or(DirectoryError::NotFound)?;

        if let Some(email) = &update.email {
            if by_email.get(email).is_some_and(|owner| *owner != id) {
                return Err(DirectoryError::Conflict(email.clone()));
            }
            by_email.remove(&account.email);
            by_email.insert(email.clone(), id);
        }

        update.apply_to(account, Utc::now());
        Ok(account.clone())
    }

    async fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<Account, DirectoryError> {
        self.update(id, |account| {
            account.status = status;
            account.updated_at = Utc::now();
        })
    }

    async fn set_password_hash(&self, id: AccountId, hash: PasswordDigest) -> Result<(), DirectoryError> {
        self.update(id, |account| {
            account.password_hash = hash;
            account.updated_at = Utc::now();
        })
        .map(|_| ())
    }

    async fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> Result<Account, DirectoryError> {
        self.update(id, |account| account.last_login = Some(at))
    }

    async fn list(&self, query: &AccountQuery) -> Result<AccountPage, DirectoryError> {
        let state = self.read()?;

        let mut matching: Vec<&Account> = state
            .accounts
            .values()
            .filter(|a| query.matches(a))
            .collect();
        // Newest first; ids are time-ordered, so they break creation-time ties.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let accounts = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(AccountPage::new(accounts, total, query))
    }
}
