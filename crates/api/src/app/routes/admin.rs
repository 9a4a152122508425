//! Admin routes for account administration.
//!
//! Mounted under `/admin` behind both the authentication and the admin
//! authorization gate; handlers assume an admitted admin principal.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};

use keygate_core::AccountId;

use crate::app::services::{AppServices, ServiceError};
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/activate", put(activate_user))
        .route("/users/:id/deactivate", put(deactivate_user))
}

/// An id that does not parse cannot name an account.
fn parse_id(raw: &str) -> Result<AccountId, ServiceError> {
    raw.parse::<AccountId>().map_err(|_| ServiceError::NotFound)
}

/// GET /admin/users
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    query: Option<Query<dto::ListUsersQuery>>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default().into_query();

    match services.list_accounts(&query).await {
        Ok(page) => Json(dto::ApiResponse::ok(dto::UsersPayload::from(page))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// PUT /admin/users/:id/activate
pub async fn activate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let result = match parse_id(&id) {
        Ok(id) => services.activate_account(id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(account) => Json(
            dto::ApiResponse::ok(dto::UserPayload { user: account.view() })
                .with_message("User activated successfully"),
        )
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// PUT /admin/users/:id/deactivate
pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let result = match parse_id(&id) {
        Ok(id) => services.deactivate_account(id, principal.principal()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(account) => Json(
            dto::ApiResponse::ok(dto::UserPayload { user: account.view() })
                .with_message("User deactivated successfully"),
        )
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
