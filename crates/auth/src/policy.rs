//! Access policy routing: which requests need a validated token, which belong
//! to the form/cookie session flow, and which are public.
//!
//! Two independent rule tables are kept, one per [`PolicyFamily`], each under
//! its own base prefix. A request is first assigned to the family whose base
//! matches its path, then the most specific rule of that family decides.
//! Declaration order never matters.

use thiserror::Error;

use crate::Requirement;

/// Which authentication regime governs a path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PolicyFamily {
    /// Stateless bearer tokens.
    Token,
    /// Form login with a server-side cookie session.
    Session,
}

impl PolicyFamily {
    /// Policy applied to family paths that no public rule covers.
    pub fn authenticated_policy(self) -> AccessPolicy {
        match self {
            PolicyFamily::Token => AccessPolicy::RequiresToken,
            PolicyFamily::Session => AccessPolicy::RequiresSession,
        }
    }
}

impl core::fmt::Display for PolicyFamily {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PolicyFamily::Token => f.write_str("token"),
            PolicyFamily::Session => f.write_str("session"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    Public,
    RequiresToken,
    RequiresSession,
}

impl AccessPolicy {
    fn family(self) -> Option<PolicyFamily> {
        match self {
            AccessPolicy::Public => None,
            AccessPolicy::RequiresToken => Some(PolicyFamily::Token),
            AccessPolicy::RequiresSession => Some(PolicyFamily::Session),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterConfigError {
    #[error("invalid path pattern '{0}'")]
    InvalidPattern(String),

    #[error("token family '{token}' overlaps session family '{session}'")]
    OverlappingFamilies { token: String, session: String },

    #[error("the {0} family is not configured")]
    FamilyNotConfigured(PolicyFamily),

    #[error("pattern '{pattern}' lies outside the {family} family")]
    RuleOutsideFamily { pattern: String, family: PolicyFamily },

    #[error("{policy:?} is not allowed in the {family} family")]
    PolicyNotAllowed { policy: AccessPolicy, family: PolicyFamily },

    #[error("pattern '{0}' is declared with conflicting policies")]
    ConflictingRules(String),
}

/// A literal path, optionally followed by `/**` ("this path and everything below it").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    literal: String,
    nested: bool,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, RouterConfigError> {
        let invalid = || RouterConfigError::InvalidPattern(raw.to_string());

        if !raw.starts_with('/') {
            return Err(invalid());
        }

        let (literal, nested) = match raw.strip_suffix("/**") {
            Some(prefix) => (prefix, true),
            None => (raw, false),
        };
        if literal.contains('*') || literal.contains('?') {
            return Err(invalid());
        }

        let literal = if nested {
            literal.trim_end_matches('/').to_string()
        } else {
            normalize(literal).to_string()
        };

        Ok(Self {
            raw: raw.to_string(),
            literal,
            nested,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `path` must already be normalized (see [`normalize`]).
    fn matches(&self, path: &str) -> bool {
        if path == self.literal {
            return true;
        }
        self.nested
            && path
                .strip_prefix(self.literal.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Every path matched by `other` is also matched by `self`.
    fn contains(&self, other: &PathPattern) -> bool {
        if self.nested {
            self.matches(&other.literal)
        } else {
            !other.nested && self.literal == other.literal
        }
    }

    /// Some path is matched by both.
    fn overlaps(&self, other: &PathPattern) -> bool {
        self.matches(&other.literal) || other.matches(&self.literal)
    }

    fn same_paths(&self, other: &PathPattern) -> bool {
        self.literal == other.literal && self.nested == other.nested
    }

    /// Longer literal first; at equal length an exact pattern beats a wildcard.
    fn specificity(&self) -> (usize, bool) {
        (self.literal.len(), !self.nested)
    }
}

/// Drop a trailing `/` (except for the root path).
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pattern: PathPattern,
    policy: AccessPolicy,
    requirement: Option<Requirement>,
}

impl AccessRule {
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    pub fn requirement(&self) -> Option<&Requirement> {
        self.requirement.as_ref()
    }
}

/// Endpoints of the form-login flow.
///
/// The router uses the login and logout paths (kept public) and the success
/// path (forbidden fallback). The failure and post-logout targets belong to
/// the form-login handler that backs a session resolver; it reads them
/// through [`AccessRouter::session_routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRoutes {
    pub login_path: String,
    pub default_success_path: String,
    /// Where a failed form login lands.
    pub failure_path: String,
    pub logout_path: String,
    /// Where a completed logout lands.
    pub logout_success_path: String,
}

impl Default for SessionRoutes {
    fn default() -> Self {
        Self {
            login_path: "/web/auth/login".to_string(),
            default_success_path: "/web/home".to_string(),
            failure_path: "/web/auth/login?error=Bad%20Credentials".to_string(),
            logout_path: "/web/auth/logout".to_string(),
            logout_success_path: "/web/auth/login?logout".to_string(),
        }
    }
}

/// Outcome of resolving a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub family: Option<PolicyFamily>,
    pub policy: AccessPolicy,
    pub requirement: Option<Requirement>,
}

/// What the boundary should do with a request that may not proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// Structured rejection (token family).
    Reject,
    /// Send the browser elsewhere (session family).
    Redirect(String),
}

#[derive(Debug, Clone)]
struct FamilyTable {
    family: PolicyFamily,
    base: PathPattern,
    rules: Vec<AccessRule>,
}

impl FamilyTable {
    fn resolve(&self, path: &str) -> Route {
        let policy = self.family.authenticated_policy();
        match self.rules.iter().find(|rule| rule.pattern.matches(path)) {
            Some(rule) => Route {
                family: Some(self.family),
                policy: rule.policy,
                requirement: rule.requirement.clone(),
            },
            None => Route {
                family: Some(self.family),
                policy,
                requirement: None,
            },
        }
    }
}

/// Resolved, validated rule tables. Immutable; shared across requests.
#[derive(Debug, Clone)]
pub struct AccessRouter {
    token: Option<FamilyTable>,
    session: Option<FamilyTable>,
    session_routes: Option<SessionRoutes>,
    fallback: AccessPolicy,
}

impl AccessRouter {
    pub fn builder() -> AccessRouterBuilder {
        AccessRouterBuilder::default()
    }

    /// The deployment layout: `/api/v1/**` for tokens, `/web/**` for the
    /// session UI, with per-area authority rules under both.
    pub fn standard(session_routes: SessionRoutes) -> Result<Self, RouterConfigError> {
        use PolicyFamily::{Session, Token};

        Self::builder()
            .token_family("/api/v1/**")
            .session_family("/web/**", session_routes)
            .public(Token, "/api/v1/auth/**")
            .require(Token, "/api/v1/users/**", Requirement::permission("VIEW_USERS"))
            .require(Token, "/api/v1/roles/**", Requirement::permission("VIEW_ROLES"))
            .require(Token, "/api/v1/permissions/**", Requirement::permission("VIEW_PERMISSIONS"))
            .require(Token, "/api/v1/schedule/**", Requirement::permission("VIEW_SCHEDULES"))
            .require(Token, "/api/v1/admin/**", Requirement::role("ADMIN"))
            .public(Session, "/web/auth/**")
            .public(Session, "/web/css/**")
            .public(Session, "/web/js/**")
            .public(Session, "/web/img/**")
            .require(Session, "/web/users/**", Requirement::permission("VIEW_USERS"))
            .require(Session, "/web/roles/**", Requirement::permission("VIEW_ROLES"))
            .require(Session, "/web/permissions/**", Requirement::permission("VIEW_PERMISSIONS"))
            .require(Session, "/web/admin/**", Requirement::role("ADMIN"))
            .build()
    }

    /// Policy for a request path (query string excluded). Never fails.
    pub fn resolve(&self, path: &str) -> Route {
        let path = normalize(path);

        for table in [&self.token, &self.session].into_iter().flatten() {
            if table.base.matches(path) {
                return table.resolve(path);
            }
        }

        Route {
            family: self.fallback.family(),
            policy: self.fallback,
            requirement: None,
        }
    }

    /// Rules of `family`, most specific first.
    pub fn rules(&self, family: PolicyFamily) -> &[AccessRule] {
        let table = match family {
            PolicyFamily::Token => self.token.as_ref(),
            PolicyFamily::Session => self.session.as_ref(),
        };
        table.map(|t| t.rules.as_slice()).unwrap_or_default()
    }

    /// Form-login endpoints, when a session family is configured.
    pub fn session_routes(&self) -> Option<&SessionRoutes> {
        self.session_routes.as_ref()
    }

    /// Denial for a request without a usable credential.
    pub fn unauthenticated(&self, family: PolicyFamily) -> Denial {
        match (family, &self.session_routes) {
            (PolicyFamily::Session, Some(routes)) => Denial::Redirect(routes.login_path.clone()),
            _ => Denial::Reject,
        }
    }

    /// Denial for an authenticated caller lacking the rule's authority.
    ///
    /// Session requests go back to the page they came from with an error
    /// parameter (added once), or to the landing page when there is no usable
    /// referer. Only the path and query of the referer are kept, so the
    /// redirect never leaves this origin.
    pub fn forbidden(&self, family: PolicyFamily, referer: Option<&str>) -> Denial {
        const ACCESS_DENIED: &str = "error=Access%20Denied";

        let Some(routes) = self
            .session_routes
            .as_ref()
            .filter(|_| family == PolicyFamily::Session)
        else {
            return Denial::Reject;
        };

        let target = match referer.and_then(same_origin_target) {
            Some(target) if target.contains("error=") => target.to_string(),
            Some(target) => {
                let separator = if target.contains('?') { '&' } else { '?' };
                format!("{target}{separator}{ACCESS_DENIED}")
            }
            None => format!("{}?{ACCESS_DENIED}", routes.default_success_path),
        };

        Denial::Redirect(target)
    }
}

/// Path and query of a referer, or `None` when it cannot be reduced to one
/// that stays on this origin.
fn same_origin_target(referer: &str) -> Option<&str> {
    let target = if referer.starts_with('/') {
        referer
    } else {
        let (_, rest) = referer.split_once("://")?;
        rest.find('/').map_or("/", |at| &rest[at..])
    };

    // Browsers read both `//host` and `/\host` as another authority.
    let leaves_origin = target.starts_with("//") || target.starts_with("/\\");
    (!leaves_origin).then_some(target)
}

struct PendingRule {
    family: PolicyFamily,
    pattern: String,
    policy: AccessPolicy,
    requirement: Option<Requirement>,
}

/// Collects families and rules; all validation happens in [`build`](Self::build).
#[derive(Default)]
pub struct AccessRouterBuilder {
    token_base: Option<String>,
    session: Option<(String, SessionRoutes)>,
    rules: Vec<PendingRule>,
    fallback: Option<AccessPolicy>,
}

impl AccessRouterBuilder {
    pub fn token_family(mut self, base: impl Into<String>) -> Self {
        self.token_base = Some(base.into());
        self
    }

    pub fn session_family(mut self, base: impl Into<String>, routes: SessionRoutes) -> Self {
        self.session = Some((base.into(), routes));
        self
    }

    pub fn rule(
        mut self,
        family: PolicyFamily,
        pattern: impl Into<String>,
        policy: AccessPolicy,
    ) -> Self {
        self.rules.push(PendingRule {
            family,
            pattern: pattern.into(),
            policy,
            requirement: None,
        });
        self
    }

    pub fn public(self, family: PolicyFamily, pattern: impl Into<String>) -> Self {
        self.rule(family, pattern, AccessPolicy::Public)
    }

    /// Authenticated access plus an authority requirement.
    pub fn require(
        mut self,
        family: PolicyFamily,
        pattern: impl Into<String>,
        requirement: Requirement,
    ) -> Self {
        self.rules.push(PendingRule {
            family,
            pattern: pattern.into(),
            policy: family.authenticated_policy(),
            requirement: Some(requirement),
        });
        self
    }

    /// Policy for paths outside both families. Defaults to public.
    pub fn fallback(mut self, policy: AccessPolicy) -> Self {
        self.fallback = Some(policy);
        self
    }

    pub fn build(self) -> Result<AccessRouter, RouterConfigError> {
        let mut token = self
            .token_base
            .as_deref()
            .map(|base| family_table(PolicyFamily::Token, base))
            .transpose()?;

        let (mut session, session_routes) = match self.session {
            Some((base, routes)) => {
                (Some(family_table(PolicyFamily::Session, &base)?), Some(routes))
            }
            None => (None, None),
        };

        if let (Some(t), Some(s)) = (&token, &session) {
            if t.base.overlaps(&s.base) {
                return Err(RouterConfigError::OverlappingFamilies {
                    token: t.base.as_str().to_string(),
                    session: s.base.as_str().to_string(),
                });
            }
        }

        let mut rules = self.rules;
        if let Some(routes) = &session_routes {
            for path in [&routes.login_path, &routes.logout_path] {
                let path = path.split('?').next().unwrap_or_default();
                rules.push(PendingRule {
                    family: PolicyFamily::Session,
                    pattern: path.to_string(),
                    policy: AccessPolicy::Public,
                    requirement: None,
                });
            }
        }

        for pending in rules {
            let table = match pending.family {
                PolicyFamily::Token => token.as_mut(),
                PolicyFamily::Session => session.as_mut(),
            }
            .ok_or(RouterConfigError::FamilyNotConfigured(pending.family))?;

            add_rule(table, pending)?;
        }

        for table in [&mut token, &mut session].into_iter().flatten() {
            table
                .rules
                .sort_by(|a, b| b.pattern.specificity().cmp(&a.pattern.specificity()));
        }

        let fallback = self.fallback.unwrap_or(AccessPolicy::Public);
        if let Some(family) = fallback.family() {
            let configured = match family {
                PolicyFamily::Token => token.is_some(),
                PolicyFamily::Session => session.is_some(),
            };
            if !configured {
                return Err(RouterConfigError::FamilyNotConfigured(family));
            }
        }

        tracing::debug!(
            token_rules = token.as_ref().map_or(0, |t| t.rules.len()),
            session_rules = session.as_ref().map_or(0, |s| s.rules.len()),
            ?fallback,
            "access router built"
        );

        Ok(AccessRouter {
            token,
            session,
            session_routes,
            fallback,
        })
    }
}

fn family_table(family: PolicyFamily, base: &str) -> Result<FamilyTable, RouterConfigError> {
    Ok(FamilyTable {
        family,
        base: PathPattern::parse(base)?,
        rules: Vec::new(),
    })
}

fn add_rule(table: &mut FamilyTable, pending: PendingRule) -> Result<(), RouterConfigError> {
    let pattern = PathPattern::parse(&pending.pattern)?;

    if !table.base.contains(&pattern) {
        return Err(RouterConfigError::RuleOutsideFamily {
            pattern: pending.pattern,
            family: table.family,
        });
    }

    if pending.policy != AccessPolicy::Public
        && pending.policy != table.family.authenticated_policy()
    {
        return Err(RouterConfigError::PolicyNotAllowed {
            policy: pending.policy,
            family: table.family,
        });
    }

    let rule = AccessRule {
        pattern,
        policy: pending.policy,
        requirement: pending.requirement,
    };

    match table.rules.iter().find(|r| r.pattern.same_paths(&rule.pattern)) {
        Some(existing)
            if existing.policy == rule.policy && existing.requirement == rule.requirement =>
        {
            Ok(())
        }
        Some(_) => Err(RouterConfigError::ConflictingRules(pending.pattern)),
        None => {
            table.rules.push(rule);
            Ok(())
        }
    }
}
