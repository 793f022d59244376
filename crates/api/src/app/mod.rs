//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: shared handles used by handlers (codec, directory)
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method, request::Parts},
    routing::get,
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use oncologic_auth::{
    AccessRouter, PolicyFamily, RouterConfigError, TokenCodec, TokenValidator, UserDirectory,
};

use crate::config::ApiConfig;
use crate::middleware::{self, AuthState, NoSessions};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Every request, including unmatched paths, passes through the access
/// middleware, so the access policy decides before routing does. CORS sits
/// outside it so that preflight requests are answered without a token.
pub fn build_app(
    config: &ApiConfig,
    directory: Arc<dyn UserDirectory>,
) -> Result<Router, RouterConfigError> {
    let codec = Arc::new(TokenCodec::new(&config.token));
    let access = Arc::new(AccessRouter::standard(config.session.clone())?);

    if let Some(routes) = access.session_routes() {
        tracing::info!(
            login = %routes.login_path,
            logout = %routes.logout_path,
            "session endpoints kept public"
        );
    }

    let cors = cors_layer(Arc::clone(&access), config.cors_allowed_origins.clone());

    let auth_state = AuthState {
        access,
        tokens: Arc::new(TokenValidator::new(Arc::clone(&codec))),
        directory: Arc::clone(&directory),
        sessions: Arc::new(NoSessions),
    };

    let services = services::AuthServices { codec, directory };

    tracing::info!(
        algorithm = ?config.token.algorithm(),
        lifetime_minutes = config.token.lifetime().as_minutes(),
        "token issuance configured"
    );

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(axum::middleware::from_fn_with_state(
                    auth_state,
                    middleware::access_middleware,
                ))
                .layer(Extension(services)),
        ))
}

/// Cross-origin access for the token family only, from the listed origins.
fn cors_layer(access: Arc<AccessRouter>, allowed: Vec<HeaderValue>) -> CorsLayer {
    let origin = AllowOrigin::predicate(move |origin: &HeaderValue, parts: &Parts| {
        access.resolve(parts.uri.path()).family == Some(PolicyFamily::Token)
            && allowed.contains(origin)
    });

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
