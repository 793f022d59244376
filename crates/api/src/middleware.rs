use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use oncologic_auth::{
    AccessPolicy, AccessRouter, AuthenticatedUser, DirectoryError, PolicyFamily, TokenVerifier,
    UserDirectory,
};

use crate::app::errors::json_error;
use crate::authz;
use crate::context::PrincipalContext;

/// Looks up the cookie session behind a browser request.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<AuthenticatedUser>;
}

/// No server-side sessions: every session-family request is unauthenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSessions;

impl SessionResolver for NoSessions {
    fn resolve(&self, _headers: &HeaderMap) -> Option<AuthenticatedUser> {
        None
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub access: Arc<AccessRouter>,
    pub tokens: Arc<dyn TokenVerifier>,
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: Arc<dyn SessionResolver>,
}

/// Why a bearer credential was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    MissingToken,
    InvalidToken,
    Expired,
    DirectoryUnavailable,
}

impl IntoResponse for TokenRejection {
    fn into_response(self) -> Response {
        match self {
            TokenRejection::MissingToken => {
                json_error(StatusCode::UNAUTHORIZED, "missing_token", "bearer token required")
            }
            TokenRejection::InvalidToken => {
                json_error(StatusCode::UNAUTHORIZED, "invalid_token", "token is not valid")
            }
            TokenRejection::Expired => {
                json_error(StatusCode::UNAUTHORIZED, "token_expired", "token has expired")
            }
            TokenRejection::DirectoryUnavailable => json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "directory_unavailable",
                "user directory unavailable",
            ),
        }
    }
}

/// Apply the access policy of the request path before any handler runs.
pub async fn access_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let route = state.access.resolve(req.uri().path());

    let (family, user) = match route.policy {
        AccessPolicy::Public => return next.run(req).await,
        AccessPolicy::RequiresToken => {
            match authenticate_bearer(&state, req.headers(), Utc::now()) {
                Ok(user) => (PolicyFamily::Token, user),
                Err(rejection) => {
                    tracing::debug!(path = %req.uri().path(), ?rejection, "bearer token rejected");
                    return rejection.into_response();
                }
            }
        }
        AccessPolicy::RequiresSession => match state.sessions.resolve(req.headers()) {
            Some(user) => (PolicyFamily::Session, user),
            None => {
                let denial = state.access.unauthenticated(PolicyFamily::Session);
                return authz::denial_response(
                    denial,
                    StatusCode::UNAUTHORIZED,
                    "unauthenticated",
                    "login required",
                );
            }
        },
    };

    if let Some(requirement) = &route.requirement {
        if let Err(err) = authz::check(&user, requirement) {
            let referer = req
                .headers()
                .get(axum::http::header::REFERER)
                .and_then(|v| v.to_str().ok());
            let denial = state.access.forbidden(family, referer);
            return authz::denial_response(
                denial,
                StatusCode::FORBIDDEN,
                "forbidden",
                err.to_string(),
            );
        }
    }

    req.extensions_mut().insert(PrincipalContext::new(user));

    next.run(req).await
}

/// Resolve the caller behind an `Authorization: Bearer` header.
///
/// The subject is read first, then the directory's current principal is
/// loaded and the token validated against it.
pub fn authenticate_bearer(
    state: &AuthState,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> Result<AuthenticatedUser, TokenRejection> {
    let token = extract_bearer(headers).ok_or(TokenRejection::MissingToken)?;

    let subject = state
        .tokens
        .extract_subject(token)
        .map_err(|_| TokenRejection::InvalidToken)?;

    let principal = state.directory.load_principal(&subject).map_err(|err| match err {
        DirectoryError::Unavailable(reason) => {
            tracing::error!(%reason, "user directory unavailable");
            TokenRejection::DirectoryUnavailable
        }
        DirectoryError::UnknownUser(_) | DirectoryError::InvalidCredentials => {
            TokenRejection::InvalidToken
        }
    })?;

    if state.tokens.validate_at(token, principal.identity(), now) {
        return Ok(AuthenticatedUser::from(&principal));
    }

    match state.tokens.is_expired_at(token, now) {
        Ok(true) => Err(TokenRejection::Expired),
        _ => Err(TokenRejection::InvalidToken),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::HeaderValue;
    use chrono::Duration;
    use oncologic_auth::{
        DirectoryEntry, InMemoryDirectory, Principal, SessionRoutes, TokenCodec, TokenConfig,
        TokenValidator,
    };

    const SECRET: &str = "middleware-test-secret-0123456789abcdef";

    struct DownDirectory;

    impl UserDirectory for DownDirectory {
        fn authenticate(&self, _: &str, _: &str) -> Result<Principal, DirectoryError> {
            Err(DirectoryError::Unavailable("down".into()))
        }

        fn load_principal(&self, _: &str) -> Result<Principal, DirectoryError> {
            Err(DirectoryError::Unavailable("down".into()))
        }
    }

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(&TokenConfig::from_parts(SECRET, 30).unwrap()))
    }

    fn state(codec: Arc<TokenCodec>, directory: Arc<dyn UserDirectory>) -> AuthState {
        AuthState {
            access: Arc::new(AccessRouter::standard(SessionRoutes::default()).unwrap()),
            tokens: Arc::new(TokenValidator::new(codec)),
            directory,
            sessions: Arc::new(NoSessions),
        }
    }

    fn alice_directory() -> Arc<dyn UserDirectory> {
        Arc::new(InMemoryDirectory::new().with_user(DirectoryEntry {
            username: "alice".into(),
            password: "pw".into(),
            roles: vec!["DOCTOR".into()],
            permissions: vec!["VIEW_SCHEDULES".into()],
        }))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn alice() -> Principal {
        Principal::new("alice", [], [])
    }

    #[test]
    fn extract_bearer_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi "),
        );
        assert_eq!(extract_bearer(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn valid_token_yields_directory_principal() {
        let codec = codec();
        let (token, _) = codec.issue(&alice(), Utc::now()).unwrap();
        let state = state(codec, alice_directory());

        let user = authenticate_bearer(&state, &bearer(&token), Utc::now()).unwrap();
        assert_eq!(user.username(), "alice");
        assert!(user.has_role("DOCTOR"));
        assert!(user.has_permission("VIEW_SCHEDULES"));
    }

    #[test]
    fn rejections_are_distinguished() {
        let codec = codec();
        let state = state(Arc::clone(&codec), alice_directory());
        let now = Utc::now();

        assert_eq!(
            authenticate_bearer(&state, &HeaderMap::new(), now),
            Err(TokenRejection::MissingToken)
        );
        assert_eq!(
            authenticate_bearer(&state, &bearer("not-a-token"), now),
            Err(TokenRejection::InvalidToken)
        );

        let (stale, _) = codec.issue(&alice(), now - Duration::hours(2)).unwrap();
        assert_eq!(
            authenticate_bearer(&state, &bearer(&stale), now),
            Err(TokenRejection::Expired)
        );

        let (stranger, _) = codec.issue(&Principal::new("mallory", [], []), now).unwrap();
        assert_eq!(
            authenticate_bearer(&state, &bearer(&stranger), now),
            Err(TokenRejection::InvalidToken)
        );
    }

    #[test]
    fn directory_outage_is_not_reported_as_bad_token() {
        let codec = codec();
        let (token, _) = codec.issue(&alice(), Utc::now()).unwrap();
        let state = state(codec, Arc::new(DownDirectory));

        assert_eq!(
            authenticate_bearer(&state, &bearer(&token), Utc::now()),
            Err(TokenRejection::DirectoryUnavailable)
        );
    }
}
