use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod system;

/// Routes under the token family. Access is decided by the middleware.
pub fn router() -> Router {
    Router::new()
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/profile", get(system::profile))
}
