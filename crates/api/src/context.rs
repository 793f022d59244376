use oncologic_auth::AuthenticatedUser;

/// Authenticated caller for a request, inserted by the access middleware.
///
/// Immutable; handlers read it through `Extension<PrincipalContext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user: AuthenticatedUser,
}

impl PrincipalContext {
    pub fn new(user: AuthenticatedUser) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    pub fn username(&self) -> &str {
        self.user.username()
    }
}
