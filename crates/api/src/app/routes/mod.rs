use axum::{
    routing::{get, post},
    Router,
};

pub mod admin;
pub mod auth;
pub mod system;
pub mod users;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
}

/// Endpoints that need an authenticated, active principal.
pub fn authenticated_router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/users", users::router())
}
