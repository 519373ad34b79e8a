//! Storage traits and row types for the directory.
//!
//! | Trait | Description |
//! |-------|-------------|
//! | [`UserRepository`] | Users and their memberships |
//! | [`OrganizationRepository`] | Organizations and their members |
//! | [`TeamRepository`] | Teams and their members |
//! | [`GrantRepository`] | Grants attached to teams |
//! | [`TokenRepository`] | Hashed access tokens |
//!
//! Method names carry the entity, so one type can implement every trait.
//! With the `mocks` feature, [`MockDirectory`] does exactly that in memory
//! and also serves as a [`GrantStore`](crate::permissions::GrantStore).

mod filter;
mod grant;
mod organization;
mod team;
mod token;
mod user;

#[cfg(any(test, feature = "mocks"))]
mod memory;
#[cfg(any(test, feature = "mocks"))]
mod token_mock;

pub use filter::{ActiveFilter, ArchivedFilter};
pub use grant::{Grant, GrantRepository, NewGrant};
pub use organization::{Organization, OrganizationRepository};
pub use team::{CreateTeam, Team, TeamFilter, TeamRepository};
pub use token::{AccessToken, TokenRepository};
pub use user::{NewUser, User, UserChanges, UserRepository};

#[cfg(any(test, feature = "mocks"))]
pub use memory::MockDirectory;
#[cfg(any(test, feature = "mocks"))]
pub use token_mock::MockTokenRepository;
