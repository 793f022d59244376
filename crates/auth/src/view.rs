use serde::Serialize;

use crate::Principal;

/// Read-only view of an authenticated caller, attached to the request once
/// its token has been validated.
///
/// Rebuilt from the principal on every successful validation. It carries
/// nothing that could be turned back into a token; renewal goes through
/// [`Claims::issue`](crate::Claims::issue) and the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    username: String,
    roles: Vec<String>,
    permissions: Vec<String>,
}

impl AuthenticatedUser {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Exact match, or the `*` wildcard.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p == permission || crate::Permission::is_wildcard_name(p))
    }
}

impl From<&Principal> for AuthenticatedUser {
    fn from(principal: &Principal) -> Self {
        Self {
            username: principal.identity().to_string(),
            roles: principal.roles().iter().map(|r| r.as_str().to_string()).collect(),
            permissions: principal
                .permissions()
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Permission, Role};

    #[test]
    fn projects_username_roles_and_permissions() {
        let principal = Principal::new(
            "dr.house",
            [Role::new("DOCTOR")],
            [Permission::new("VIEW_USERS"), Permission::new("VIEW_SCHEDULES")],
        );
        let user = AuthenticatedUser::from(&principal);

        assert_eq!(user.username(), "dr.house");
        assert!(user.has_role("DOCTOR"));
        assert!(!user.has_role("doctor"));
        assert!(user.has_permission("VIEW_SCHEDULES"));
        assert!(!user.has_permission("VIEW_ROLES"));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "username": "dr.house",
                "roles": ["DOCTOR"],
                "permissions": ["VIEW_USERS", "VIEW_SCHEDULES"],
            })
        );
    }

    #[test]
    fn wildcard_permission_grants_everything() {
        let principal = Principal::new("root", [Role::new("ADMIN")], [Permission::new("*")]);
        let user = AuthenticatedUser::from(&principal);

        assert!(user.has_permission("VIEW_USERS"));
        assert!(user.has_permission("anything.at.all"));
    }
}
