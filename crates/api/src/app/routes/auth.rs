use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use oncologic_auth::DirectoryError;

use crate::app::dto::{AuthResponse, LoginRequest};
use crate::app::errors::{invalid_body, json_error};
use crate::app::services::AuthServices;

/// Check credentials with the directory and hand back a signed token.
pub async fn login(
    Extension(services): Extension<AuthServices>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => return invalid_body(rejection),
    };

    let principal = match services.directory.authenticate(&request.username, &request.password) {
        Ok(principal) => principal,
        Err(DirectoryError::InvalidCredentials | DirectoryError::UnknownUser(_)) => {
            tracing::info!(username = %request.username, "login rejected");
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Err(err) => {
            tracing::error!(error = %err, "login failed");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "directory_unavailable",
                err.to_string(),
            );
        }
    };

    match services.codec.issue(&principal, Utc::now()) {
        Ok((token, _)) => Json(AuthResponse {
            token,
            username: principal.identity().to_string(),
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "token signing failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "token_error", "could not issue token")
        }
    }
}
