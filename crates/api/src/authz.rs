//! Boundary side of authorization: apply a rule's requirement to the caller
//! and turn a [`Denial`] into an HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use oncologic_auth::{authorize, AuthenticatedUser, AuthzError, Denial, Requirement};

use crate::app::errors::json_error;

pub fn check(user: &AuthenticatedUser, requirement: &Requirement) -> Result<(), AuthzError> {
    authorize(user, requirement).inspect_err(|err| {
        tracing::info!(username = %user.username(), %err, "access denied");
    })
}

/// `Reject` becomes a JSON error with `status`; `Redirect` a `303 See Other`.
pub fn denial_response(
    denial: Denial,
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    match denial {
        Denial::Reject => json_error(status, code, message),
        Denial::Redirect(target) => Redirect::to(&target).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn reject_keeps_status() {
        let res = denial_response(Denial::Reject, StatusCode::FORBIDDEN, "forbidden", "no");
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn redirect_points_at_target() {
        let res = denial_response(
            Denial::Redirect("/web/home?error=Access%20Denied".into()),
            StatusCode::FORBIDDEN,
            "forbidden",
            "no",
        );
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[LOCATION], "/web/home?error=Access%20Denied");
    }
}
