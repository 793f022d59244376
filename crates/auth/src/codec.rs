//! Token codec: claims ⇄ compact HMAC-signed JWT.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

use crate::config::{HmacAlgorithm, TokenConfig, TokenLifetime};
use crate::error::{EncodeError, TokenError};
use crate::{Claims, Principal};

/// Signs claims into tokens and turns tokens back into verified claims.
///
/// Holds the keys derived from the configured secret. Immutable after
/// construction and safe to share between threads.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: HmacAlgorithm,
    lifetime: TokenLifetime,
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig) -> Self {
        let algorithm = config.algorithm();
        let secret = config.secret().as_bytes();

        // Only the configured algorithm is accepted. Expiry is checked here,
        // not by the library, so that it can be skipped for subject reads.
        let mut validation = Validation::new(algorithm.jwt_algorithm());
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            algorithm,
            lifetime: config.lifetime(),
            header: Header::new(algorithm.jwt_algorithm()),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn algorithm(&self) -> HmacAlgorithm {
        self.algorithm
    }

    pub fn lifetime(&self) -> TokenLifetime {
        self.lifetime
    }

    /// Sign `claims`. The output depends only on the claims and the key.
    pub fn encode(&self, claims: &Claims) -> Result<String, EncodeError> {
        Ok(jsonwebtoken::encode(&self.header, claims, &self.encoding_key)?)
    }

    /// Build claims for `principal` at `now` with the configured lifetime and sign them.
    pub fn issue(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<(String, Claims), EncodeError> {
        let claims = Claims::issue(principal, now, self.lifetime);
        let token = self.encode(&claims)?;

        tracing::debug!(
            subject = %claims.subject(),
            expires_at = %claims.expires_at(),
            "issued token"
        );

        Ok((token, claims))
    }

    /// Verify and decode `token`, rejecting it if it has expired at `now`.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = self.decode_ignoring_expiry(token)?;
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired {
                expired_at: claims.expires_at(),
            });
        }
        Ok(claims)
    }

    /// Verify and decode `token` without looking at its expiry.
    ///
    /// The signature is checked before the payload is deserialized; nothing in
    /// the payload is trusted unless the signature matched.
    pub fn decode_ignoring_expiry(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| classify(&err))
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

fn classify(err: &jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        // A header naming another algorithm is treated like a wrong key.
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
        _ => TokenError::Malformed,
    }
}
