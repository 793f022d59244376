//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;
use thiserror::Error;

use oncologic_auth::{ConfigError, SessionRoutes, TokenConfig};

/// Used when `APP_SECURITY_SECRET_KEY` is unset. Never use outside development.
pub const DEV_SECRET: &str = "oncologic-insecure-development-signing-key";

pub const DEFAULT_EXPIRATION_MINUTES: u32 = 30;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Dev server of the single-page client.
pub const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "http://localhost:5173";

#[derive(Debug, Error)]
pub enum ApiConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} is not a socket address: '{value}'")]
    InvalidAddress { var: &'static str, value: String },

    #[error("{var} contains an invalid origin: '{value}'")]
    InvalidOrigin { var: &'static str, value: String },

    #[error(transparent)]
    Token(#[from] ConfigError),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub token: TokenConfig,
    pub session: SessionRoutes,
    pub directory_file: Option<PathBuf>,
    /// Browser origins allowed to call the token API cross-origin.
    pub cors_allowed_origins: Vec<HeaderValue>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ApiConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiConfigError> {
        let secret = lookup("APP_SECURITY_SECRET_KEY").unwrap_or_else(|| {
            tracing::warn!("APP_SECURITY_SECRET_KEY not set; using insecure dev default");
            DEV_SECRET.to_string()
        });

        let minutes = match lookup("APP_SECURITY_EXPIRATION_MINUTES") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .map_err(|_| ApiConfigError::InvalidNumber {
                    var: "APP_SECURITY_EXPIRATION_MINUTES",
                    value,
                })?,
            None => DEFAULT_EXPIRATION_MINUTES,
        };

        let token = TokenConfig::from_parts(secret, minutes)?;

        let bind = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind.parse::<SocketAddr>().map_err(|_| ApiConfigError::InvalidAddress {
            var: "BIND_ADDR",
            value: bind.clone(),
        })?;

        let defaults = SessionRoutes::default();
        let session = SessionRoutes {
            login_path: lookup("SESSION_LOGIN_PATH").unwrap_or(defaults.login_path),
            default_success_path: lookup("SESSION_SUCCESS_PATH")
                .unwrap_or(defaults.default_success_path),
            failure_path: lookup("SESSION_FAILURE_PATH").unwrap_or(defaults.failure_path),
            logout_path: lookup("SESSION_LOGOUT_PATH").unwrap_or(defaults.logout_path),
            logout_success_path: lookup("SESSION_LOGOUT_SUCCESS_PATH")
                .unwrap_or(defaults.logout_success_path),
        };

        let origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGINS.to_string());

        Ok(Self {
            bind_addr,
            token,
            session,
            directory_file: lookup("DIRECTORY_FILE").map(PathBuf::from),
            cors_allowed_origins: parse_origins(&origins)?,
        })
    }
}

/// Comma-separated origins; blanks are skipped, so an empty value allows none.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ApiConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ApiConfigError::InvalidOrigin {
                var: "CORS_ALLOWED_ORIGINS",
                value: origin.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use oncologic_auth::HmacAlgorithm;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ApiConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();

        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(cfg.token.lifetime().as_minutes(), DEFAULT_EXPIRATION_MINUTES);
        assert_eq!(cfg.token.secret().as_bytes(), DEV_SECRET.as_bytes());
        assert_eq!(cfg.session, SessionRoutes::default());
        assert!(cfg.directory_file.is_none());
        assert_eq!(cfg.cors_allowed_origins, [DEFAULT_CORS_ALLOWED_ORIGINS]);
    }

    #[test]
    fn values_are_read_from_lookup() {
        let secret = "universidadicesiuniversidadicesiuniversidadicesi";
        let cfg = config(&[
            ("APP_SECURITY_SECRET_KEY", secret),
            ("APP_SECURITY_EXPIRATION_MINUTES", "5"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("SESSION_LOGIN_PATH", "/web/signin"),
            ("DIRECTORY_FILE", "/etc/oncologic/users.json"),
            ("CORS_ALLOWED_ORIGINS", "https://app.clinic.local, http://localhost:3000,"),
        ])
        .unwrap();

        assert_eq!(cfg.token.lifetime().as_minutes(), 5);
        assert_eq!(cfg.token.algorithm(), HmacAlgorithm::Hs384);
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.session.login_path, "/web/signin");
        assert_eq!(cfg.session.default_success_path, "/web/home");
        assert_eq!(cfg.directory_file, Some(PathBuf::from("/etc/oncologic/users.json")));
        assert_eq!(
            cfg.cors_allowed_origins,
            ["https://app.clinic.local", "http://localhost:3000"]
        );

        let closed = config(&[("CORS_ALLOWED_ORIGINS", "")]).unwrap();
        assert!(closed.cors_allowed_origins.is_empty());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("APP_SECURITY_EXPIRATION_MINUTES", "soon")]),
            Err(ApiConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            config(&[("APP_SECURITY_EXPIRATION_MINUTES", "0")]),
            Err(ApiConfigError::Token(ConfigError::NonPositiveLifetime))
        ));
        assert!(matches!(
            config(&[("APP_SECURITY_SECRET_KEY", "short")]),
            Err(ApiConfigError::Token(ConfigError::WeakSecret { .. }))
        ));
        assert!(matches!(
            config(&[("BIND_ADDR", "localhost")]),
            Err(ApiConfigError::InvalidAddress { .. })
        ));
        assert!(matches!(
            config(&[("CORS_ALLOWED_ORIGINS", "http://ok.local,bad\norigin")]),
            Err(ApiConfigError::InvalidOrigin { .. })
        ));
    }
}
