//! Postgres-backed account directory.
//!
//! Every mutation is a single `UPDATE ... RETURNING` / `INSERT` statement, so
//! per-record atomicity comes from Postgres itself. Email uniqueness is
//! enforced by the `accounts_email_key` unique index; a violation surfaces as
//! `DirectoryError::Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use keygate_auth::{
    Account, AccountDirectory, AccountPage, AccountQuery, AccountStatus, DirectoryError,
    NewAccount, PasswordDigest, ProfileUpdate, Role,
};
use keygate_core::{AccountId, Email};

const SCHEMA: &str = include_str!("../../migrations/0001_accounts.sql");

const COLUMNS: &str =
    "id, email, full_name, password_hash, role, status, last_login, created_at, updated_at";

/// Account directory stored in the `accounts` table.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool, which is cheap to clone and `Send + Sync`.
#[derive(Debug, Clone)]
pub struct PostgresAccountDirectory {
    pool: PgPool,
}

impl PostgresAccountDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Create the schema if it does not exist yet (idempotent).
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("account directory schema ready");
        Ok(())
    }
}

fn backend(e: sqlx::Error) -> DirectoryError {
    tracing::error!(error = %e, "account directory query failed");
    DirectoryError::Backend(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn row_to_account(row: &PgRow) -> Result<Account, DirectoryError> {
    let id: Uuid = row.try_get("id").map_err(backend)?;
    let email: String = row.try_get("email").map_err(backend)?;
    let role: String = row.try_get("role").map_err(backend)?;
    let status: String = row.try_get("status").map_err(backend)?;
    let password_hash: String = row.try_get("password_hash").map_err(backend)?;

    Ok(Account {
        id: AccountId::from_uuid(id),
        email: Email::parse(&email).map_err(|e| DirectoryError::Backend(e.to_string()))?,
        full_name: row.try_get("full_name").map_err(backend)?,
        password_hash: PasswordDigest::from_stored(password_hash),
        role: role.parse::<Role>().map_err(DirectoryError::Backend)?,
        status: status.parse::<AccountStatus>().map_err(DirectoryError::Backend)?,
        last_login: row.try_get("last_login").map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

/// Substring ILIKE pattern with the LIKE metacharacters escaped.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &AccountQuery) {
    qb.push(" WHERE TRUE");
    if let Some(role) = query.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(search) = &query.search {
        let pattern = like_pattern(search);
        qb.push(" AND (email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR full_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl AccountDirectory for PostgresAccountDirectory {
    async fn insert(&self, account: NewAccount) -> Result<Account, DirectoryError> {
        let now = Utc::now();
        let id = AccountId::new();

        let sql = format!(
            "INSERT INTO accounts ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, NULL, $7, $7) RETURNING {COLUMNS}"
        );
        let result = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(account.email.as_str())
            .bind(&account.full_name)
            .bind(account.password_hash.as_str())
            .bind(account.role.as_str())
            .bind(account.status.as_str())
            .bind(now)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => row_to_account(&row),
            Err(e) if is_unique_violation(&e) => Err(DirectoryError::Conflict(account.email)),
            Err(e) => Err(backend(e)),
        }
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, DirectoryError> {
        let sql = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, DirectoryError> {
        let sql = format!("SELECT {COLUMNS} FROM accounts WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> Result<Account, DirectoryError> {
        let sql = format!(
            "UPDATE accounts \
             SET email = COALESCE($2, email), full_name = COALESCE($3, full_name), updated_at = $4 \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        let result = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(update.email.as_ref().map(Email::as_str))
            .bind(update.full_name.as_deref())
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(Some(row)) => row_to_account(&row),
            Ok(None) => Err(DirectoryError::NotFound),
            Err(e) if is_unique_violation(&e) => match update.email {
                Some(email) => Err(DirectoryError::Conflict(email)),
                None => Err(backend(e)),
            },
            Err(e) => Err(backend(e)),
        }
    }

    async fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<Account, DirectoryError> {
        let sql = format!(
            "UPDATE accounts SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or(DirectoryError::NotFound)?;

        row_to_account(&row)
    }

    async fn set_password_hash(&self, id: AccountId, hash: PasswordDigest) -> Result<(), DirectoryError> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(hash.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::NotFound);
        }
        Ok(())
    }

    async fn record_login(&self, id: AccountId, at: DateTime<Utc>) -> Result<Account, DirectoryError> {
        let sql = format!("UPDATE accounts SET last_login = $2 WHERE id = $1 RETURNING {COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or(DirectoryError::NotFound)?;

        row_to_account(&row)
    }

    async fn list(&self, query: &AccountQuery) -> Result<AccountPage, DirectoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts");
        push_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM accounts"));
        push_filters(&mut select, query);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        let accounts = rows
            .iter()
            .map(row_to_account)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AccountPage::new(accounts, u64::try_from(total).unwrap_or(0), query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn directory() -> PostgresAccountDirectory {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for postgres tests");
        let dir = PostgresAccountDirectory::connect(&url).await.unwrap();
        dir.migrate().await.unwrap();
        dir
    }

    #[test]
    fn schema_declares_unique_email_index() {
        assert!(SCHEMA.contains("CREATE UNIQUE INDEX IF NOT EXISTS accounts_email_key ON accounts (email)"));
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn filters_bind_in_declaration_order() {
        let query = AccountQuery {
            search: Some("50%".to_string()),
            role: Some(Role::Admin),
            status: Some(AccountStatus::Active),
            ..AccountQuery::new(None, None)
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts");
        push_filters(&mut qb, &query);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM accounts WHERE TRUE AND role = $1 AND status = $2 \
             AND (email ILIKE $3 OR full_name ILIKE $4)"
        );
    }

    #[test]
    fn no_filters_leaves_an_open_where() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts");
        push_filters(&mut qb, &AccountQuery::new(None, None));
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM accounts WHERE TRUE");
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
    async fn insert_conflict_and_status_roundtrip() {
        let dir = directory().await;

        let email = Email::parse(&format!("pg-{}@example.com", AccountId::new())).unwrap();
        let created = dir
            .insert(NewAccount::new(
                email.clone(),
                "Pg User",
                PasswordDigest::from_stored("$argon2id$stub"),
                Role::User,
            ))
            .await
            .unwrap();
        assert_eq!(dir.find_by_email(&email).await.unwrap().map(|a| a.id), Some(created.id));

        let dup = dir
            .insert(NewAccount::new(
                email.clone(),
                "Other",
                PasswordDigest::from_stored("$argon2id$stub"),
                Role::User,
            ))
            .await;
        assert!(matches!(dup, Err(DirectoryError::Conflict(_))));

        let updated = dir.set_status(created.id, AccountStatus::Inactive).await.unwrap();
        assert_eq!(updated.status, AccountStatus::Inactive);
    }
}
