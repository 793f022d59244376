//! `oncologic-auth`: stateless authentication core.
//!
//! Token issuance and verification, the per-path access policy, and the
//! authenticated-user view handed to authorization checks. No HTTP, no storage.

pub mod authorize;
pub mod claims;
pub mod codec;
pub mod config;
pub mod directory;
pub mod error;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod validator;
pub mod view;

pub use authorize::{authorize, AuthzError, Requirement};
pub use claims::Claims;
pub use codec::TokenCodec;
pub use config::{HmacAlgorithm, SigningSecret, TokenConfig, TokenLifetime};
pub use directory::{DirectoryEntry, DirectoryError, InMemoryDirectory, UserDirectory};
pub use error::{ConfigError, EncodeError, TokenError};
pub use permissions::Permission;
pub use policy::{
    AccessPolicy, AccessRouter, AccessRouterBuilder, AccessRule, Denial, PathPattern, PolicyFamily,
    Route, RouterConfigError, SessionRoutes,
};
pub use principal::Principal;
pub use roles::Role;
pub use validator::{TokenValidator, TokenVerifier};
pub use view::AuthenticatedUser;
