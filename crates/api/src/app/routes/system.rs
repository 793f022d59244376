use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Username, roles and permissions of the caller.
pub async fn profile(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(principal.user().clone())
}

pub async fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}
