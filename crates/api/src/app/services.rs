//! Application services: the flows behind each endpoint, wired to the
//! account directory and token service.
//!
//! Handlers stay thin; everything here returns a typed [`ServiceError`] that
//! `errors.rs` maps to a status code.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use keygate_auth::{
    self as auth, Account, AccountDirectory, AccountPage, AccountQuery, AuthnError, AuthzError,
    CredentialError, DirectoryError, IssuedToken, LifecycleError, NewAccount, PasswordDigest,
    PasswordError, Principal, ProfileUpdate, Role, TokenError, TokenService,
};
use keygate_core::AccountId;
use keygate_infra::{InMemoryAccountDirectory, PostgresAccountDirectory};

use crate::app::dto::FieldError;
use crate::app::validation::{Login, ProfileChanges, Signup};
use crate::config::{AdminBootstrap, ApiConfig};
use crate::middleware::AuthState;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Authentication(#[from] AuthnError),

    /// Failed login; never says which half was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password change with a current secret that does not verify.
    #[error("current password is incorrect")]
    CurrentPasswordIncorrect,

    #[error(transparent)]
    Authorization(#[from] AuthzError),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("user not found")]
    NotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DirectoryError> for ServiceError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Conflict(email) => {
                ServiceError::Conflict(format!("An account with email {email} already exists"))
            }
            DirectoryError::NotFound => ServiceError::NotFound,
            DirectoryError::Backend(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<CredentialError> for ServiceError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidCredential => ServiceError::CurrentPasswordIncorrect,
            CredentialError::Hashing(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<Vec<FieldError>> for ServiceError {
    fn from(errors: Vec<FieldError>) -> Self {
        ServiceError::Validation(errors)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Account plus a freshly issued token.
#[derive(Debug)]
pub struct Authenticated {
    pub account: Account,
    pub token: IssuedToken,
}

/// Run CPU-heavy password work off the async executor.
async fn blocking<T, F>(f: F) -> ServiceResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("password task failed: {e}")))
}

#[derive(Clone)]
pub struct AppServices {
    directory: Arc<dyn AccountDirectory>,
    tokens: Arc<TokenService>,
}

impl AppServices {
    pub fn new(directory: Arc<dyn AccountDirectory>, tokens: Arc<TokenService>) -> Self {
        Self { directory, tokens }
    }

    /// State for the authentication middleware; shares this instance's
    /// directory and token service.
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            tokens: self.tokens.clone(),
            directory: self.directory.clone(),
        }
    }

    async fn load(&self, id: AccountId) -> ServiceResult<Account> {
        self.directory
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    // -------------------------
    // Registration / login
    // -------------------------

    pub async fn signup(&self, input: Signup) -> ServiceResult<Authenticated> {
        // Fast path for a friendly error; the directory re-checks at write time.
        if self.directory.find_by_email(&input.email).await?.is_some() {
            return Err(DirectoryError::Conflict(input.email).into());
        }

        let Signup {
            email,
            password,
            full_name,
        } = input;
        let digest = blocking(move || auth::hash_password(&password)).await??;

        let account = self
            .directory
            .insert(NewAccount::new(email, full_name, digest, Role::User))
            .await?;
        let token = self.tokens.issue(account.id, account.role)?;

        info!(account_id = %account.id, "account registered");
        Ok(Authenticated { account, token })
    }

    /// Inactive accounts may still log in; the authentication gate rejects
    /// their tokens on the next request.
    pub async fn login(&self, input: Login) -> ServiceResult<Authenticated> {
        let Login { email, password } = input;
        let account = self.directory.find_by_email(&email).await?;

        let stored = account.as_ref().map(|a| a.password_hash.clone());
        let verified = blocking(move || auth::verify_login(&password, stored.as_ref())).await?;

        let account = match account {
            Some(account) if verified => account,
            _ => {
                warn!("login rejected");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let account = self.directory.record_login(account.id, Utc::now()).await?;
        let token = self.tokens.issue(account.id, account.role)?;

        info!(account_id = %account.id, "login succeeded");
        Ok(Authenticated { account, token })
    }

    // -------------------------
    // Own profile
    // -------------------------

    pub async fn current_account(&self, principal: &Principal) -> ServiceResult<Account> {
        self.load(principal.account_id).await
    }

    pub async fn update_profile(
        &self,
        principal: &Principal,
        changes: ProfileChanges,
    ) -> ServiceResult<Account> {
        let update = ProfileUpdate {
            email: changes.email,
            full_name: changes.full_name,
        };
        if update.is_empty() {
            return Err(ServiceError::BadRequest("No valid fields to update".to_string()));
        }

        match self.directory.update_profile(principal.account_id, update).await {
            Ok(account) => Ok(account),
            Err(DirectoryError::Conflict(_)) => Err(ServiceError::Conflict(
                "Email is already taken by another user".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Issued tokens stay valid after a change until they expire.
    pub async fn change_password(
        &self,
        principal: &Principal,
        current: String,
        new: String,
    ) -> ServiceResult<()> {
        let account = self.load(principal.account_id).await?;
        let stored = account.password_hash;

        let digest: PasswordDigest =
            blocking(move || auth::rotate_password(&current, &new, &stored)).await??;

        self.directory.set_password_hash(account.id, digest).await?;
        info!(account_id = %account.id, "password changed");
        Ok(())
    }

    // -------------------------
    // Administration
    // -------------------------

    pub async fn list_accounts(&self, query: &AccountQuery) -> ServiceResult<AccountPage> {
        Ok(self.directory.list(query).await?)
    }

    pub async fn activate_account(&self, id: AccountId) -> ServiceResult<Account> {
        let target = self.load(id).await?;
        let change = auth::activate(&target)?;
        Ok(self.directory.set_status(change.account_id, change.to).await?)
    }

    pub async fn deactivate_account(&self, id: AccountId, actor: &Principal) -> ServiceResult<Account> {
        let target = self.load(id).await?;
        let change = auth::deactivate(&target, actor)?;
        Ok(self.directory.set_status(change.account_id, change.to).await?)
    }

    /// Create the configured administrator unless its email is already taken.
    pub async fn bootstrap_admin(&self, admin: &AdminBootstrap) -> ServiceResult<Option<Account>> {
        if self.directory.find_by_email(&admin.email).await?.is_some() {
            info!(email = %admin.email, "bootstrap admin already present");
            return Ok(None);
        }

        let password = admin.password.clone();
        let digest = blocking(move || auth::hash_password(&password)).await??;

        let account = self
            .directory
            .insert(NewAccount::new(admin.email.clone(), "Administrator", digest, Role::Admin))
            .await?;

        info!(account_id = %account.id, email = %account.email, "bootstrap admin created");
        Ok(Some(account))
    }
}

/// Wire the directory backend and token service from configuration.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let directory: Arc<dyn AccountDirectory> = match &config.database_url {
        Some(url) => {
            let pg = PostgresAccountDirectory::connect(url).await?;
            pg.migrate().await?;
            info!("using postgres account directory");
            Arc::new(pg)
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory account directory");
            Arc::new(InMemoryAccountDirectory::new())
        }
    };

    let tokens = TokenService::new(config.signing_key.clone(), config.token_ttl)?;
    Ok(AppServices::new(directory, Arc::new(tokens)))
}

/// In-memory services for tests and local runs.
pub fn in_memory_services(tokens: TokenService) -> AppServices {
    AppServices::new(Arc::new(InMemoryAccountDirectory::new()), Arc::new(tokens))
}
