use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission name derived from a principal's roles (e.g. "VIEW_USERS").
///
/// The special wildcard `"*"` grants every permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: &'static str = "*";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        Self::is_wildcard_name(self.as_str())
    }

    /// Wildcard check for a bare permission name.
    pub fn is_wildcard_name(name: &str) -> bool {
        name == Self::WILDCARD
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_is_recognised_by_value_and_by_name() {
        assert!(Permission::new(Permission::WILDCARD).is_wildcard());
        assert!(Permission::is_wildcard_name("*"));
        assert!(!Permission::new("VIEW_USERS").is_wildcard());
        assert!(!Permission::is_wildcard_name("**"));
    }
}
