//! Seam to the external user directory.
//!
//! The directory owns users, roles, permissions and password storage. This
//! crate only consumes what it vouches for: a [`Principal`].

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Credential verification and principal lookup.
pub trait UserDirectory: Send + Sync {
    /// Verify credentials and return the matching principal.
    fn authenticate(&self, username: &str, password: &str) -> Result<Principal, DirectoryError>;

    /// Current principal for a username already proven by a token.
    fn load_principal(&self, username: &str) -> Result<Principal, DirectoryError>;
}

/// One user as listed in a directory seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryEntry {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone)]
struct StoredUser {
    password: String,
    principal: Principal,
}

/// Fixed in-memory directory for development and tests.
///
/// Credentials are compared as given; it is not meant to hold real passwords.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    users: HashMap<String, StoredUser>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, entry: DirectoryEntry) -> Self {
        self.insert(entry);
        self
    }

    pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let mut directory = Self::new();
        for entry in entries {
            directory.insert(entry);
        }
        directory
    }

    /// Load a JSON array of [`DirectoryEntry`] values.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read directory file {}", path.display()))?;
        let entries: Vec<DirectoryEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid directory file {}", path.display()))?;
        Ok(Self::from_entries(entries))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn insert(&mut self, entry: DirectoryEntry) {
        let principal = Principal::new(
            entry.username.clone(),
            entry.roles.into_iter().map(Role::from),
            entry.permissions.into_iter().map(Permission::from),
        );
        self.users.insert(
            entry.username,
            StoredUser {
                password: entry.password,
                principal,
            },
        );
    }
}

impl UserDirectory for InMemoryDirectory {
    fn authenticate(&self, username: &str, password: &str) -> Result<Principal, DirectoryError> {
        match self.users.get(username) {
            Some(user) if user.password == password => Ok(user.principal.clone()),
            // Unknown users and wrong passwords look the same to the caller.
            _ => Err(DirectoryError::InvalidCredentials),
        }
    }

    fn load_principal(&self, username: &str) -> Result<Principal, DirectoryError> {
        self.users
            .get(username)
            .map(|user| user.principal.clone())
            .ok_or_else(|| DirectoryError::UnknownUser(username.to_string()))
    }
}
