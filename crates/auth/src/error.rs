//! Error types for token handling and configuration.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a presented token could not be used.
///
/// The three kinds are handled differently by callers: `Malformed` is garbage
/// input, `BadSignature` is a security event (tampering or a secret mismatch),
/// and `Expired` is the normal end of a token's life.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },
}

impl TokenError {
    /// Short machine-readable code, used in logs and error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::BadSignature => "bad_signature",
            TokenError::Expired { .. } => "expired",
        }
    }
}

/// Signing a set of claims failed.
#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct EncodeError(#[from] jsonwebtoken::errors::Error);

/// Invalid token configuration, detected once at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("signing secret is {len} bytes; at least {min} bytes are required")]
    WeakSecret { len: usize, min: usize },

    #[error("token lifetime must be a positive number of minutes")]
    NonPositiveLifetime,
}
