//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: directory/token wiring and the endpoint flows
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and the response envelope
//! - `validation.rs`: request-body rules
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{middleware::from_fn, middleware::from_fn_with_state, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;
pub mod validation;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
///
/// Gates are composed statically: everything outside the public router runs
/// the authentication gate, and `/admin` additionally runs the admin gate.
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    let auth_state = services.auth_state();

    let admin = Router::new()
        .nest("/admin", routes::admin::router())
        .route_layer(from_fn(middleware::require_admin));

    let protected = routes::authenticated_router()
        .merge(admin)
        .route_layer(from_fn_with_state(auth_state, middleware::auth_middleware));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
