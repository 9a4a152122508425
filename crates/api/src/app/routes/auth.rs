use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::app::services::{AppServices, Authenticated};
use crate::app::{dto, errors, validation};
use crate::context::PrincipalContext;

fn auth_payload(auth: Authenticated) -> dto::AuthPayload {
    dto::AuthPayload {
        user: auth.account.view(),
        token: auth.token.token,
        expires_at: auth.token.expires_at,
    }
}

/// POST /auth/signup
pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::SignupRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let input = match validation::signup(body) {
        Ok(input) => input,
        Err(field_errors) => return errors::validation_error(field_errors),
    };

    match services.signup(input).await {
        Ok(auth) => (
            StatusCode::CREATED,
            Json(dto::ApiResponse::ok(auth_payload(auth)).with_message("User registered successfully")),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let input = match validation::login(body) {
        Ok(input) => input,
        Err(field_errors) => return errors::validation_error(field_errors),
    };

    match services.login(input).await {
        Ok(auth) => Json(dto::ApiResponse::ok(auth_payload(auth)).with_message("Login successful"))
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// GET /auth/me
pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    match services.current_account(principal.principal()).await {
        Ok(account) => Json(dto::ApiResponse::ok(dto::UserPayload { user: account.view() })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
