//! Immutable token configuration: signing secret and lifetime.

use chrono::Duration;
use jsonwebtoken::Algorithm;

use crate::error::ConfigError;

/// Shortest secret accepted for HMAC signing (256 bits).
pub const MIN_SECRET_LEN: usize = 32;

/// Raw signing secret bytes. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SigningSecret(<{} bytes redacted>)", self.0.len())
    }
}

/// HMAC variant, picked from the key length: the strongest one the key is long enough for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HmacAlgorithm {
    Hs256,
    Hs384,
    Hs512,
}

impl HmacAlgorithm {
    pub fn for_key_len(len: usize) -> Option<Self> {
        match len {
            64.. => Some(Self::Hs512),
            48.. => Some(Self::Hs384),
            MIN_SECRET_LEN.. => Some(Self::Hs256),
            _ => None,
        }
    }

    pub fn jwt_algorithm(self) -> Algorithm {
        match self {
            Self::Hs256 => Algorithm::HS256,
            Self::Hs384 => Algorithm::HS384,
            Self::Hs512 => Algorithm::HS512,
        }
    }
}

/// Positive token lifetime in whole minutes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TokenLifetime(u32);

impl TokenLifetime {
    pub fn minutes(minutes: u32) -> Result<Self, ConfigError> {
        if minutes == 0 {
            return Err(ConfigError::NonPositiveLifetime);
        }
        Ok(Self(minutes))
    }

    pub fn as_minutes(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }
}

/// Process-wide token settings, built once at startup and handed to
/// [`TokenCodec::new`](crate::TokenCodec::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    secret: SigningSecret,
    algorithm: HmacAlgorithm,
    lifetime: TokenLifetime,
}

impl TokenConfig {
    pub fn new(secret: SigningSecret, lifetime: TokenLifetime) -> Result<Self, ConfigError> {
        let algorithm = HmacAlgorithm::for_key_len(secret.len()).ok_or(ConfigError::WeakSecret {
            len: secret.len(),
            min: MIN_SECRET_LEN,
        })?;

        Ok(Self {
            secret,
            algorithm,
            lifetime,
        })
    }

    /// Shorthand for string secrets and a minute count.
    pub fn from_parts(
        secret: impl Into<Vec<u8>>,
        lifetime_minutes: u32,
    ) -> Result<Self, ConfigError> {
        Self::new(SigningSecret::new(secret), TokenLifetime::minutes(lifetime_minutes)?)
    }

    pub fn secret(&self) -> &SigningSecret {
        &self.secret
    }

    pub fn algorithm(&self) -> HmacAlgorithm {
        self.algorithm
    }

    pub fn lifetime(&self) -> TokenLifetime {
        self.lifetime
    }
}
