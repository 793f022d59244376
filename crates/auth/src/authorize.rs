use thiserror::Error;

use crate::{AuthenticatedUser, Permission, Role};

/// Authority an access rule can demand on top of authentication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requirement {
    Permission(Permission),
    Role(Role),
}

impl Requirement {
    pub fn permission(name: &'static str) -> Self {
        Self::Permission(Permission::new(name))
    }

    pub fn role(name: &'static str) -> Self {
        Self::Role(Role::new(name))
    }
}

impl core::fmt::Display for Requirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Requirement::Permission(p) => write!(f, "permission '{p}'"),
            Requirement::Role(r) => write!(f, "role '{r}'"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing {0}")]
    Forbidden(String),
}

/// Check an authenticated caller against a requirement.
///
/// - No IO
/// - No panics
/// - `*` in the permission list satisfies any permission requirement
pub fn authorize(user: &AuthenticatedUser, required: &Requirement) -> Result<(), AuthzError> {
    let granted = match required {
        Requirement::Permission(p) => user.has_permission(p.as_str()),
        Requirement::Role(r) => user.has_role(r.as_str()),
    };

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Principal;

    fn user(roles: &[&'static str], permissions: &[&'static str]) -> AuthenticatedUser {
        let principal = Principal::new(
            "alice",
            roles.iter().copied().map(Role::from),
            permissions.iter().copied().map(Permission::from),
        );
        AuthenticatedUser::from(&principal)
    }

    #[test]
    fn permission_requirement() {
        let u = user(&["DOCTOR"], &["VIEW_USERS"]);

        assert_eq!(authorize(&u, &Requirement::permission("VIEW_USERS")), Ok(()));
        assert_eq!(
            authorize(&u, &Requirement::permission("VIEW_ROLES")),
            Err(AuthzError::Forbidden("permission 'VIEW_ROLES'".into()))
        );
    }

    #[test]
    fn role_requirement() {
        let u = user(&["ADMIN"], &[]);

        assert!(authorize(&u, &Requirement::role("ADMIN")).is_ok());
        assert!(authorize(&u, &Requirement::role("DOCTOR")).is_err());
    }

    #[test]
    fn wildcard_grants_any_permission_but_not_roles() {
        let u = user(&[], &["*"]);

        assert!(authorize(&u, &Requirement::permission("VIEW_SCHEDULES")).is_ok());
        assert!(authorize(&u, &Requirement::role("ADMIN")).is_err());
    }
}
