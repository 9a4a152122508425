use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use keygate_auth::{AccountStatus, AuthnError, LifecycleError};

use crate::app::dto::{ApiResponse, FieldError};
use crate::app::services::ServiceError;

const UNAUTHENTICATED: &str = "Access denied. No valid token provided.";
const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INTERNAL: &str = "Internal server error";

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        message: Some(message.into()),
        data: None,
        errors: None,
    };
    (status, Json(body)).into_response()
}

pub fn validation_error(errors: Vec<FieldError>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        message: Some("Validation failed".to_string()),
        data: None,
        errors: Some(errors),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Malformed or non-JSON request bodies.
pub fn json_rejection_to_response(rejection: JsonRejection) -> Response {
    tracing::debug!(error = %rejection.body_text(), "rejected request body");
    json_error(StatusCode::BAD_REQUEST, "Invalid JSON request body")
}

pub fn authn_error_to_response(err: AuthnError) -> Response {
    match err {
        // Inactive accounts get the same body as a bad token; the gate logs the difference.
        AuthnError::MissingCredential | AuthnError::InvalidCredential | AuthnError::AccountInactive => {
            json_error(StatusCode::UNAUTHORIZED, UNAUTHENTICATED)
        }
        AuthnError::Directory(msg) => {
            tracing::error!(error = %msg, "authentication lookup failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
        }
    }
}

pub fn service_error_to_response(err: ServiceError) -> Response {
    match err {
        ServiceError::Validation(errors) => validation_error(errors),
        ServiceError::BadRequest(msg) | ServiceError::Conflict(msg) => {
            json_error(StatusCode::BAD_REQUEST, msg)
        }
        ServiceError::Authentication(e) => authn_error_to_response(e),
        ServiceError::InvalidCredentials => json_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS),
        ServiceError::CurrentPasswordIncorrect => {
            json_error(StatusCode::UNAUTHORIZED, "Current password is incorrect")
        }
        ServiceError::Authorization(_) => {
            json_error(StatusCode::FORBIDDEN, "Access denied. Insufficient permissions.")
        }
        ServiceError::Lifecycle(LifecycleError::AlreadyInState(AccountStatus::Active)) => {
            json_error(StatusCode::BAD_REQUEST, "User is already active")
        }
        ServiceError::Lifecycle(LifecycleError::AlreadyInState(AccountStatus::Inactive)) => {
            json_error(StatusCode::BAD_REQUEST, "User is already inactive")
        }
        ServiceError::Lifecycle(LifecycleError::SelfActionForbidden) => {
            json_error(StatusCode::BAD_REQUEST, "You cannot deactivate your own account")
        }
        ServiceError::NotFound => json_error(StatusCode::NOT_FOUND, "User not found"),
        ServiceError::Internal(msg) => {
            tracing::error!(error = %msg, "request failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_auth::{AuthzError, Role};

    fn status(err: ServiceError) -> StatusCode {
        service_error_to_response(err).status()
    }

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(status(ServiceError::Validation(vec![])), StatusCode::BAD_REQUEST);
        assert_eq!(status(ServiceError::Conflict("dup".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(ServiceError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(ServiceError::Authentication(AuthnError::AccountInactive)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(ServiceError::Authentication(AuthnError::Directory("down".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(ServiceError::Authorization(AuthzError::Forbidden { required: Role::Admin })),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(ServiceError::Lifecycle(LifecycleError::SelfActionForbidden)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(ServiceError::CurrentPasswordIncorrect), StatusCode::UNAUTHORIZED);
        assert_eq!(status(ServiceError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(ServiceError::Internal("boom".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    async fn body(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn inactive_account_is_indistinguishable_from_bad_token() {
        let inactive = authn_error_to_response(AuthnError::AccountInactive);
        let invalid = authn_error_to_response(AuthnError::InvalidCredential);
        assert_eq!(inactive.status(), invalid.status());
        assert_eq!(body(inactive).await, body(invalid).await);
    }

    #[tokio::test]
    async fn wrong_current_password_has_its_own_message() {
        let resp = service_error_to_response(ServiceError::CurrentPasswordIncorrect);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let text = body(resp).await;
        assert!(text.contains("Current password is incorrect"));
        assert!(!text.contains(INVALID_CREDENTIALS));
    }
}
