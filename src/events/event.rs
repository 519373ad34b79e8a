use chrono::{DateTime, Utc};

use crate::permissions::{DenyReason, ResourceAction, ResourceKind};

/// Directory events fired by the HTTP handlers and the authorizer.
///
/// Dispatch is a no-op until listeners are registered via
/// [`register_event_listeners`](crate::register_event_listeners).
#[derive(Debug, Clone)]
pub enum DirectoryEvent {
    // organizations
    OrganizationCreated {
        organization_id: i64,
        by: i64,
        at: DateTime<Utc>,
    },
    OrganizationArchived {
        organization_id: i64,
        by: i64,
        at: DateTime<Utc>,
    },

    // teams
    TeamCreated {
        team_id: i64,
        organization_id: i64,
        by: i64,
        at: DateTime<Utc>,
    },
    TeamArchived {
        team_id: i64,
        by: i64,
        at: DateTime<Utc>,
    },

    // users
    UserCreated {
        user_id: i64,
        email: String,
        at: DateTime<Utc>,
    },
    UserDeactivated {
        user_id: i64,
        by: i64,
        at: DateTime<Utc>,
    },

    // membership, on an organization or a team
    MemberAdded {
        resource: ResourceKind,
        resource_id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    },
    MemberRemoved {
        resource: ResourceKind,
        resource_id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    },

    // grants
    GrantAdded {
        team_id: i64,
        grant_id: i64,
        grant_type: String,
        at: DateTime<Utc>,
    },
    GrantRemoved {
        team_id: i64,
        grant_id: i64,
        at: DateTime<Utc>,
    },

    AccessDenied {
        user_id: Option<i64>,
        resource: ResourceKind,
        action: ResourceAction,
        reason: DenyReason,
        at: DateTime<Utc>,
    },
}

impl DirectoryEvent {
    /// Dot-separated event name for logs and spans.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OrganizationCreated { .. } => "organization.created",
            Self::OrganizationArchived { .. } => "organization.archived",
            Self::TeamCreated { .. } => "team.created",
            Self::TeamArchived { .. } => "team.archived",
            Self::UserCreated { .. } => "user.created",
            Self::UserDeactivated { .. } => "user.deactivated",
            Self::MemberAdded { .. } => "membership.added",
            Self::MemberRemoved { .. } => "membership.removed",
            Self::GrantAdded { .. } => "grant.added",
            Self::GrantRemoved { .. } => "grant.removed",
            Self::AccessDenied { .. } => "access.denied",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::OrganizationCreated { at, .. }
            | Self::OrganizationArchived { at, .. }
            | Self::TeamCreated { at, .. }
            | Self::TeamArchived { at, .. }
            | Self::UserCreated { at, .. }
            | Self::UserDeactivated { at, .. }
            | Self::MemberAdded { at, .. }
            | Self::MemberRemoved { at, .. }
            | Self::GrantAdded { at, .. }
            | Self::GrantRemoved { at, .. }
            | Self::AccessDenied { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let now = Utc::now();

        assert_eq!(
            DirectoryEvent::OrganizationCreated {
                organization_id: 1,
                by: 2,
                at: now,
            }
            .name(),
            "organization.created"
        );
        assert_eq!(
            DirectoryEvent::MemberRemoved {
                resource: ResourceKind::Team,
                resource_id: 3,
                user_id: 4,
                at: now,
            }
            .name(),
            "membership.removed"
        );
        assert_eq!(
            DirectoryEvent::AccessDenied {
                user_id: None,
                resource: ResourceKind::User,
                action: ResourceAction::Create,
                reason: DenyReason::Unauthenticated,
                at: now,
            }
            .name(),
            "access.denied"
        );
    }

    #[test]
    fn test_event_timestamp() {
        let now = Utc::now();
        let event = DirectoryEvent::GrantAdded {
            team_id: 1,
            grant_id: 9,
            grant_type: "org:admin".to_owned(),
            at: now,
        };
        assert_eq!(event.timestamp(), now);
    }
}
