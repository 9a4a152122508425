//! Process configuration, loaded once at startup.
//!
//! Loading is load-or-fail: a missing or unusable signing secret stops the
//! process instead of falling back to a default.

use std::net::SocketAddr;

use anyhow::{anyhow, bail, Context};
use chrono::Duration;

use keygate_auth::token::{DEFAULT_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS};
use keygate_auth::SigningKey;
use keygate_core::Email;

use crate::app::validation;

pub const ENV_JWT_SECRET: &str = "KEYGATE_JWT_SECRET";
pub const ENV_TOKEN_TTL_HOURS: &str = "KEYGATE_TOKEN_TTL_HOURS";
pub const ENV_BIND_ADDR: &str = "KEYGATE_BIND_ADDR";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_ADMIN_EMAIL: &str = "KEYGATE_ADMIN_EMAIL";
pub const ENV_ADMIN_PASSWORD: &str = "KEYGATE_ADMIN_PASSWORD";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Administrator account created at startup when its email is not registered yet.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub email: Email,
    pub password: String,
}

impl core::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub signing_key: SigningKey,
    pub token_ttl: Duration,
    /// `None` selects the in-memory directory.
    pub database_url: Option<String>,
    pub bootstrap_admin: Option<AdminBootstrap>,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map instead of the
    /// process environment).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let secret = get(ENV_JWT_SECRET).ok_or_else(|| anyhow!("{ENV_JWT_SECRET} must be set"))?;
        let signing_key = SigningKey::new(secret.into_bytes()).context(ENV_JWT_SECRET)?;

        let ttl_hours = match get(ENV_TOKEN_TTL_HOURS) {
            Some(raw) => raw
                .parse::<i64>()
                .with_context(|| format!("{ENV_TOKEN_TTL_HOURS} must be an integer"))?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };
        if ttl_hours <= 0 {
            bail!("{ENV_TOKEN_TTL_HOURS} must be positive");
        }
        if ttl_hours > MAX_TOKEN_TTL_HOURS {
            bail!("{ENV_TOKEN_TTL_HOURS} must not exceed {MAX_TOKEN_TTL_HOURS}");
        }
        let token_ttl = Duration::hours(ttl_hours);

        let bind_addr = get(ENV_BIND_ADDR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .with_context(|| format!("{ENV_BIND_ADDR} must be host:port"))?;

        let bootstrap_admin = match (get(ENV_ADMIN_EMAIL), lookup(ENV_ADMIN_PASSWORD)) {
            (None, None) => None,
            (Some(email), Some(password)) => {
                let email = Email::parse(&email).context(ENV_ADMIN_EMAIL)?;
                if let Err(problems) = validation::password_policy(&password) {
                    bail!("{ENV_ADMIN_PASSWORD} is too weak: {}", problems.join("; "));
                }
                Some(AdminBootstrap { email, password })
            }
            _ => bail!("{ENV_ADMIN_EMAIL} and {ENV_ADMIN_PASSWORD} must be set together"),
        };

        Ok(Self {
            bind_addr,
            signing_key,
            token_ttl,
            database_url: get(ENV_DATABASE_URL),
            bootstrap_admin,
        })
    }
}
