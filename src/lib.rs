//! Organizations, teams and users guarded by a composable permission engine.
//!
//! The heart of the crate is [`permissions`]: a small boolean rule algebra
//! whose trees are evaluated per request against the caller's effective
//! grants. Everything else (repositories, the HTTP API, events) feeds that
//! engine or consumes its decisions.
//!
//! # Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `mocks` | In-memory [`MockDirectory`] and [`MockTokenRepository`] |
//! | `axum_api` | REST endpoints for organizations, teams and users |
//! | `sqlx_postgres` | PostgreSQL directory, token store and [`GrantStore`](permissions::GrantStore) |
//! | `tracing` | Spans on the authorizer and storage adapters |

use std::fmt;

pub mod actions;
pub mod config;
pub mod crypto;
pub mod events;
pub mod permissions;
pub mod repository;
mod secret;
pub mod validators;

#[cfg(feature = "axum_api")]
pub mod api;

#[cfg(feature = "sqlx_postgres")]
pub mod postgres;

pub use config::AuthGateConfig;
pub use events::register_event_listeners;
pub use permissions::{
    AuthContext, Authorizer, Decision, DenyReason, GrantSet, GrantStore, Policies, Principal,
    ResourceAction, ResourceKind, Target,
};
pub use repository::{
    AccessToken, ActiveFilter, ArchivedFilter, CreateTeam, Grant, GrantRepository, NewGrant,
    NewUser, Organization, OrganizationRepository, Team, TeamFilter, TeamRepository,
    TokenRepository, User, UserChanges, UserRepository,
};
pub use secret::SecretString;
pub use validators::ValidationError;

#[cfg(any(test, feature = "mocks"))]
pub use repository::{MockDirectory, MockTokenRepository};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// No principal, or the principal is inactive.
    Unauthenticated,
    /// Authenticated, but the policy evaluated to false.
    Forbidden,
    NotFound,
    /// Wrong email or password, or an inactive account, when issuing a token.
    InvalidCredentials,
    UserAlreadyExists,
    Validation(ValidationError),
    PasswordHashError,
    DatabaseError(String),
    Internal(String),
}

impl std::error::Error for AuthError {}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Unauthenticated => {
                write!(f, "Authentication credentials were not provided")
            }
            AuthError::Forbidden => {
                write!(f, "You do not have permission to perform this action")
            }
            AuthError::NotFound => write!(f, "Not found"),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::UserAlreadyExists => write!(f, "User already exists"),
            AuthError::Validation(err) => write!(f, "{err}"),
            AuthError::PasswordHashError => write!(f, "Failed to hash password"),
            AuthError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            AuthError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        AuthError::Validation(err)
    }
}

impl From<DenyReason> for AuthError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthenticated => AuthError::Unauthenticated,
            DenyReason::Forbidden => AuthError::Forbidden,
        }
    }
}
