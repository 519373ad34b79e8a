use std::fmt;

use serde::Serialize;

use crate::AuthError;
use crate::repository::{Organization, User};

use super::policies::TeamTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Organization,
    Team,
    User,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organization => write!(f, "organization"),
            Self::Team => write!(f, "team"),
            Self::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAction {
    List,
    Create,
    Retrieve,
    Update,
    Delete,
    AddMember,
    RemoveMember,
    CreateTeam,
    ListTeams,
    AddGrant,
    RemoveGrant,
}

impl ResourceAction {
    /// Collection actions run against the global tree, with no target.
    pub fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Create)
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Retrieve => "retrieve",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::AddMember => "add_member",
            Self::RemoveMember => "remove_member",
            Self::CreateTeam => "create_team",
            Self::ListTeams => "list_teams",
            Self::AddGrant => "add_grant",
            Self::RemoveGrant => "remove_grant",
        };
        f.write_str(name)
    }
}

/// The already-fetched object an instance action applies to.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Organization(&'a Organization),
    Team(&'a TeamTarget),
    User(&'a User),
}

impl Target<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Organization(_) => ResourceKind::Organization,
            Self::Team(_) => ResourceKind::Team,
            Self::User(_) => ResourceKind::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No principal, or an inactive one. Maps to 401.
    Unauthenticated,
    /// Authenticated, but no branch of the tree allowed it. Maps to 403.
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }

    /// # Errors
    ///
    /// `AuthError::Unauthenticated` or `AuthError::Forbidden` on deny.
    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason.into()),
        }
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Self::Allow
        } else {
            Self::Deny(DenyReason::Forbidden)
        }
    }
}
