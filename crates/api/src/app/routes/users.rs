//! Self-service routes for the authenticated account.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors, validation};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/change-password", put(change_password))
}

/// GET /users/profile
pub async fn get_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    match services.current_account(principal.principal()).await {
        Ok(account) => Json(dto::ApiResponse::ok(dto::UserPayload { user: account.view() })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// PUT /users/profile
pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::UpdateProfileRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let changes = match validation::update_profile(body) {
        Ok(changes) => changes,
        Err(field_errors) => return errors::validation_error(field_errors),
    };

    match services.update_profile(principal.principal(), changes).await {
        Ok(account) => Json(
            dto::ApiResponse::ok(dto::UserPayload { user: account.view() })
                .with_message("Profile updated successfully"),
        )
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// PUT /users/change-password
pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::ChangePasswordRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    if let Err(field_errors) = validation::change_password(&body) {
        return errors::validation_error(field_errors);
    }

    match services
        .change_password(principal.principal(), body.current_password, body.new_password)
        .await
    {
        Ok(()) => Json(dto::ApiResponse::message("Password changed successfully")).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
