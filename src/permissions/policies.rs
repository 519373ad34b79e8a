use crate::repository::{Organization, Team, User};

use super::context::AuthContext;
use super::decision::{Decision, DenyReason, ResourceAction, ResourceKind, Target};
use super::grants::GrantSet;
use super::policy::ResourcePolicy;
use super::rule::{Identifiable, Rule};

/// Grant types the built-in policies look for.
pub mod grant_types {
    pub const ORG_ADMIN: &str = "org:admin";
    pub const ORG_WRITE: &str = "org:write";
    pub const TEAM_ADMIN: &str = "team:admin";
    pub const TEAM_READ: &str = "team:read";
    pub const USER_CREATE: &str = "user:create";
}

use grant_types::{ORG_ADMIN, ORG_WRITE, TEAM_ADMIN, TEAM_READ, USER_CREATE};

/// A team together with the memberships its policy consults.
#[derive(Debug, Clone)]
pub struct TeamTarget {
    pub team: Team,
    pub member_ids: Vec<i64>,
    pub organization_member_ids: Vec<i64>,
}

impl Identifiable for Organization {
    fn object_id(&self) -> String {
        self.id.to_string()
    }
}

impl Identifiable for TeamTarget {
    fn object_id(&self) -> String {
        self.team.id.to_string()
    }
}

impl Identifiable for User {
    fn object_id(&self) -> String {
        self.id.to_string()
    }
}

/// The body asks to make the target an admin.
fn elevating<T: 'static>() -> Rule<T> {
    Rule::attribute("elevating", |ctx: &AuthContext, _| ctx.body_flag("admin"))
}

/// Organizations: anyone authenticated reads; admins and `org:admin` holders
/// create, update and delete any organization; `org:write` on one
/// organization updates and deletes that organization only.
pub fn organization_policy() -> ResourcePolicy<Organization> {
    ResourcePolicy::new(Rule::or([
        Rule::safe_method(),
        Rule::is_admin(),
        Rule::and([
            Rule::or([
                Rule::method_is_create(),
                Rule::method_is_update(),
                Rule::method_is_delete(),
            ]),
            Rule::has_grant(ORG_ADMIN),
        ]),
        Rule::and([
            Rule::or([Rule::method_is_update(), Rule::method_is_delete()]),
            Rule::object_grant(ORG_WRITE),
        ]),
    ]))
}

/// Nested writes under one organization: its users and its teams.
pub fn organization_membership_policy() -> ResourcePolicy<Organization> {
    ResourcePolicy::new(Rule::or([
        Rule::is_admin(),
        Rule::has_grant(ORG_ADMIN),
        Rule::object_grant(ORG_WRITE),
    ]))
}

/// Teams: full access for admins, `team:admin` on the team, and `org:admin` or
/// `org:write` on its organization; read access for `team:read` holders and
/// members of the team or its organization.
///
/// Full access includes the team's own grants. A `team:admin` holder can
/// therefore attach any grant type, `org:admin` included, to a team they
/// belong to and gain what that grant allows. Hand out `team:admin` only
/// where that is acceptable.
pub fn team_policy() -> ResourcePolicy<TeamTarget> {
    let organization_id = |t: &TeamTarget| t.team.organization_id.to_string();

    let object = Rule::or([
        Rule::is_admin(),
        Rule::object_grant(TEAM_ADMIN),
        Rule::object_grant_at(ORG_ADMIN, organization_id),
        Rule::object_grant_at(ORG_WRITE, organization_id),
        Rule::and([
            Rule::safe_method(),
            Rule::or([
                Rule::object_grant(TEAM_READ),
                Rule::attribute("is_team_member", |ctx: &AuthContext, t: Option<&TeamTarget>| {
                    matches!((ctx.principal_id(), t), (Some(id), Some(t)) if t.member_ids.contains(&id))
                }),
                Rule::attribute(
                    "is_organization_member",
                    |ctx: &AuthContext, t: Option<&TeamTarget>| {
                        matches!(
                            (ctx.principal_id(), t),
                            (Some(id), Some(t)) if t.organization_member_ids.contains(&id)
                        )
                    },
                ),
            ]),
        ]),
    ]);

    // listings are filtered per team with the object tree afterwards
    let global = Rule::and([
        Rule::authenticated(),
        Rule::or([Rule::is_admin(), Rule::safe_method()]),
    ]);

    ResourcePolicy::with_global(global, object)
}

pub fn user_policy() -> ResourcePolicy<User> {
    let target_not_admin = Rule::attribute("target_not_admin", |_: &AuthContext, u: Option<&User>| {
        u.is_none_or(|u| !u.is_admin)
    });
    let target_is_self = Rule::attribute("target_is_self", |ctx: &AuthContext, u: Option<&User>| {
        matches!((ctx.principal_id(), u), (Some(id), Some(u)) if u.id == id)
    });

    ResourcePolicy::new(Rule::or([
        Rule::safe_method(),
        Rule::is_admin(),
        Rule::and([
            Rule::has_grant(ORG_ADMIN),
            Rule::or([
                Rule::method_is_create(),
                Rule::method_is_update(),
                Rule::method_is_delete(),
            ]),
            target_not_admin,
            !elevating(),
        ]),
        Rule::and([
            target_is_self,
            Rule::or([Rule::method_is_update(), Rule::method_is_delete()]),
            !elevating(),
        ]),
        Rule::and([
            Rule::method_is_create(),
            Rule::has_grant(USER_CREATE),
            !elevating(),
        ]),
    ]))
}

/// Every policy the gate knows, built once and shared.
#[derive(Debug, Clone)]
pub struct Policies {
    pub organization: ResourcePolicy<Organization>,
    pub organization_membership: ResourcePolicy<Organization>,
    pub team: ResourcePolicy<TeamTarget>,
    pub user: ResourcePolicy<User>,
}

impl Default for Policies {
    fn default() -> Self {
        Self {
            organization: organization_policy(),
            organization_membership: organization_membership_policy(),
            team: team_policy(),
            user: user_policy(),
        }
    }
}

impl Policies {
    /// Pure decision over already-fetched inputs.
    ///
    /// A missing target, or one of the wrong kind, for an instance action is
    /// a bug at the call site: it is logged and denied as `Forbidden`.
    pub fn decide(
        &self,
        context: &AuthContext,
        grants: &GrantSet,
        resource: ResourceKind,
        action: ResourceAction,
        target: Option<Target<'_>>,
    ) -> Decision {
        use ResourceAction as A;

        if context.authenticated().is_none() {
            return Decision::Deny(DenyReason::Unauthenticated);
        }

        let allowed = match (resource, action, target) {
            (ResourceKind::Organization, A::List | A::Create, _) => {
                self.organization.allows_collection(context, grants)
            }
            (ResourceKind::Team, A::List | A::Create, _) => {
                self.team.allows_collection(context, grants)
            }
            (ResourceKind::User, A::List | A::Create, _) => {
                self.user.allows_collection(context, grants)
            }
            (
                ResourceKind::Organization,
                A::Retrieve | A::Update | A::Delete | A::ListTeams,
                Some(Target::Organization(org)),
            ) => self.organization.allows_object(context, grants, org),
            (
                ResourceKind::Organization,
                A::AddMember | A::RemoveMember | A::CreateTeam,
                Some(Target::Organization(org)),
            ) => self
                .organization_membership
                .allows_object(context, grants, org),
            (
                ResourceKind::Team,
                A::Retrieve
                | A::Update
                | A::Delete
                | A::AddMember
                | A::RemoveMember
                | A::AddGrant
                | A::RemoveGrant,
                Some(Target::Team(team)),
            ) => self.team.allows_object(context, grants, team),
            (
                ResourceKind::User,
                A::Retrieve | A::Update | A::Delete,
                Some(Target::User(user)),
            ) => self.user.allows_object(context, grants, user),
            (resource, action, target) => {
                log::error!(
                    target: "authgate",
                    "msg=\"no policy for request\", resource={resource}, action={action}, target={:?}",
                    target.map(|t| t.kind())
                );
                false
            }
        };

        Decision::from(allowed)
    }
}
