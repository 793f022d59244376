use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Body extraction failures, with axum's status and message in the JSON shape.
pub fn invalid_body(rejection: JsonRejection) -> axum::response::Response {
    json_error(rejection.status(), "invalid_request", rejection.body_text())
}
