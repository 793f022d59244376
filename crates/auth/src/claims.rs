use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TokenLifetime;
use crate::{Principal, Role};

/// What a token asserts about its bearer.
///
/// Serialized as the JWT payload: `sub`, `roles`, and `iat`/`exp` as
/// NumericDate seconds. Claims are never edited after construction; renewing a
/// token means issuing new claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    sub: String,

    #[serde(default)]
    roles: Vec<Role>,

    #[serde(with = "chrono::serde::ts_seconds")]
    iat: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    exp: DateTime<Utc>,
}

impl Claims {
    /// Claims for `principal` issued at `now` and valid for `lifetime`.
    ///
    /// `now` is truncated to whole seconds, the precision tokens carry.
    pub fn issue(principal: &Principal, now: DateTime<Utc>, lifetime: TokenLifetime) -> Self {
        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);

        Self {
            sub: principal.identity().to_string(),
            roles: principal.roles().to_vec(),
            iat: issued_at,
            exp: issued_at + lifetime.as_duration(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.iat
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.exp
    }

    /// A token is expired from its expiry instant onwards.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::Permission;

    fn principal() -> Principal {
        Principal::new(
            "alice",
            [Role::new("DOCTOR"), Role::new("ADMIN")],
            [Permission::new("VIEW_USERS")],
        )
    }

    #[test]
    fn issue_sets_subject_roles_and_window() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let claims = Claims::issue(&principal(), now, TokenLifetime::minutes(30).unwrap());

        assert_eq!(claims.subject(), "alice");
        assert_eq!(claims.roles(), &[Role::new("DOCTOR"), Role::new("ADMIN")]);
        assert_eq!(claims.issued_at(), now);
        assert_eq!(claims.expires_at(), now + Duration::minutes(30));
        assert!(claims.expires_at() > claims.issued_at());
    }

    #[test]
    fn issued_at_is_truncated_to_seconds() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::milliseconds(750);
        let claims = Claims::issue(&principal(), now, TokenLifetime::minutes(1).unwrap());

        assert_eq!(claims.issued_at().timestamp_subsec_nanos(), 0);
        assert_eq!(claims.issued_at().timestamp(), now.timestamp());
    }

    #[test]
    fn expiry_instant_counts_as_expired() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let claims = Claims::issue(&principal(), now, TokenLifetime::minutes(1).unwrap());

        assert!(!claims.is_expired_at(now));
        assert!(!claims.is_expired_at(now + Duration::seconds(59)));
        assert!(claims.is_expired_at(now + Duration::seconds(60)));
    }

    #[test]
    fn payload_uses_numeric_dates() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let claims = Claims::issue(&principal(), now, TokenLifetime::minutes(1).unwrap());

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["sub"], "alice");
        assert_eq!(json["iat"], now.timestamp());
        assert_eq!(json["exp"], now.timestamp() + 60);
        assert_eq!(json["roles"], serde_json::json!(["DOCTOR", "ADMIN"]));
    }
}
