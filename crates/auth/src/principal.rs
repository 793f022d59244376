use serde::Serialize;

use crate::{Permission, Role};

/// An identity vouched for by the user directory, with its granted roles and
/// the permissions those roles carry.
///
/// The directory builds this after it has verified credentials (or when it
/// re-loads a user for an incoming token). It is immutable: token issuance
/// and request authentication only ever read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    identity: String,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
}

impl Principal {
    /// Duplicate roles and permissions are dropped; first occurrence keeps its position.
    pub fn new(
        identity: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            identity: identity.into(),
            roles: dedup(roles),
            permissions: dedup(permissions),
        }
    }

    /// Unique username / identification string.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }
}

fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
