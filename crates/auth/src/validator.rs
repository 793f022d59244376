//! Token validation: expiry and identity checks on top of the codec.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::TokenError;
use crate::{AuthenticatedUser, Principal, TokenCodec};

const SECURITY_TARGET: &str = "oncologic::security";

/// Token checks needed by the request pipeline.
///
/// The HTTP boundary holds this as a trait object so that it never touches
/// keys directly.
pub trait TokenVerifier: Send + Sync {
    /// Subject of a well-signed token, whether or not it has expired.
    fn extract_subject(&self, token: &str) -> Result<String, TokenError>;

    /// `Ok(true)` when the token is well-signed and expired at `now`.
    /// Only `Malformed` and `BadSignature` are returned as errors.
    fn is_expired_at(&self, token: &str, now: DateTime<Utc>) -> Result<bool, TokenError>;

    /// Well-signed, bound to exactly `expected_identity`, and not expired at `now`.
    fn validate_at(&self, token: &str, expected_identity: &str, now: DateTime<Utc>) -> bool;
}

/// [`TokenVerifier`] backed by a [`TokenCodec`].
#[derive(Debug, Clone)]
pub struct TokenValidator {
    codec: Arc<TokenCodec>,
}

impl TokenValidator {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Subject of the token.
    ///
    /// Expiry is not checked here; callers use this to find out
    /// whose token was presented (including a stale one) before deciding
    /// anything. Use [`validate`](Self::validate) to decide whether it is usable.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.decode_logged(token)
            .map(|claims| claims.subject().to_string())
    }

    pub fn is_expired(&self, token: &str) -> Result<bool, TokenError> {
        self.is_expired_at(token, Utc::now())
    }

    pub fn is_expired_at(&self, token: &str, now: DateTime<Utc>) -> Result<bool, TokenError> {
        match self.codec.decode(token, now) {
            Ok(_) => Ok(false),
            Err(TokenError::Expired { expired_at }) => {
                tracing::debug!(%expired_at, "token expired");
                Ok(true)
            }
            Err(err) => {
                log_rejection(&err);
                Err(err)
            }
        }
    }

    pub fn validate(&self, token: &str, expected_identity: &str) -> bool {
        self.validate_at(token, expected_identity, Utc::now())
    }

    pub fn validate_at(&self, token: &str, expected_identity: &str, now: DateTime<Utc>) -> bool {
        let Ok(claims) = self.decode_logged(token) else {
            return false;
        };

        if claims.subject() != expected_identity {
            tracing::debug!(
                subject = %claims.subject(),
                expected = %expected_identity,
                "token subject does not match principal"
            );
            return false;
        }

        if claims.is_expired_at(now) {
            tracing::debug!(expired_at = %claims.expires_at(), "token expired");
            return false;
        }

        true
    }

    /// Validate `token` for `principal` and, on success, project the
    /// principal for downstream authorization checks.
    pub fn authenticate_at(
        &self,
        token: &str,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Option<AuthenticatedUser> {
        self.validate_at(token, principal.identity(), now)
            .then(|| AuthenticatedUser::from(principal))
    }

    fn decode_logged(&self, token: &str) -> Result<crate::Claims, TokenError> {
        self.codec.decode_ignoring_expiry(token).inspect_err(log_rejection)
    }
}

impl TokenVerifier for TokenValidator {
    fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        TokenValidator::extract_subject(self, token)
    }

    fn is_expired_at(&self, token: &str, now: DateTime<Utc>) -> Result<bool, TokenError> {
        TokenValidator::is_expired_at(self, token, now)
    }

    fn validate_at(&self, token: &str, expected_identity: &str, now: DateTime<Utc>) -> bool {
        TokenValidator::validate_at(self, token, expected_identity, now)
    }
}

fn log_rejection(err: &TokenError) {
    match err {
        TokenError::BadSignature => {
            tracing::warn!(target: SECURITY_TARGET, reason = err.code(), "rejected token");
        }
        TokenError::Malformed | TokenError::Expired { .. } => {
            tracing::debug!(reason = err.code(), "rejected token");
        }
    }
}
