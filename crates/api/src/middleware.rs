use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use keygate_auth::{AccountDirectory, Role, TokenValidator};

use crate::app::errors;
use crate::app::services::ServiceError;
use crate::authz;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenValidator>,
    pub directory: Arc<dyn AccountDirectory>,
}

/// Authentication gate: bearer token → active principal in request extensions.
///
/// The principal is inserted only after the whole gate succeeded.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    // A header that is not visible ASCII is treated like a missing one.
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let principal = match keygate_auth::authenticate(
        header,
        state.tokens.as_ref(),
        state.directory.as_ref(),
        Utc::now(),
    )
    .await
    {
        Ok(principal) => principal,
        Err(e) => return errors::authn_error_to_response(e),
    };

    req.extensions_mut().insert(PrincipalContext::new(principal));
    next.run(req).await
}

/// Authorization gate for `/admin`; must run inside [`auth_middleware`].
pub async fn require_admin(req: Request, next: Next) -> Response {
    let Some(principal) = req.extensions().get::<PrincipalContext>() else {
        return errors::authn_error_to_response(keygate_auth::AuthnError::MissingCredential);
    };

    if let Err(e) = authz::require_role(principal, Role::Admin) {
        return errors::service_error_to_response(ServiceError::from(e));
    }

    next.run(req).await
}
