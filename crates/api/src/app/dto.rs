use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keygate_auth::{AccountPage, AccountQuery, AccountStatus, AccountView, Pagination, Role};

// -------------------------
// Envelope
// -------------------------

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            errors: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            errors: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

// -------------------------
// Request DTOs
// -------------------------

// Missing fields deserialize as empty strings so they are reported by
// validation with a field name instead of failing the JSON extractor.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Query string for `GET /admin/users`. Values are parsed leniently:
/// anything unparseable falls back to "no filter" / the default.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

impl ListUsersQuery {
    pub fn into_query(self) -> AccountQuery {
        let number = |raw: Option<String>| raw.and_then(|v| v.trim().parse::<u32>().ok());

        AccountQuery::new(number(self.page), number(self.limit))
            .with_search(self.search)
            .with_role(self.role.and_then(|r| r.parse::<Role>().ok()))
            .with_status(self.status.and_then(|s| s.parse::<AccountStatus>().ok()))
    }
}

// -------------------------
// Response payloads
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: AccountView,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: AccountView,
}

#[derive(Debug, Serialize)]
pub struct UsersPayload {
    pub users: Vec<AccountView>,
    pub pagination: Pagination,
}

impl From<AccountPage> for UsersPayload {
    fn from(page: AccountPage) -> Self {
        Self {
            users: page.accounts.iter().map(|a| a.view()).collect(),
            pagination: page.pagination,
        }
    }
}
