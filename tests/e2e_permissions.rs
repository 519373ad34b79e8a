//! End-to-end tests for the permission engine over the in-memory directory.
//!
//! Run with: `cargo test --features mocks --test e2e_permissions`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use authgate::permissions::{TeamTarget, grant_types};
use authgate::{
    AuthContext, Authorizer, Decision, DenyReason, MockDirectory, NewGrant,
    OrganizationRepository, ResourceAction, ResourceKind, Target, Team, TeamRepository, User,
};
use http::Method;
use serde_json::json;

fn context(user: &User, method: Method) -> AuthContext {
    AuthContext::new(Some(user.principal()), method)
}

/// A user whose only team grants `grant_type` on `object_id`.
fn granted(
    directory: &MockDirectory,
    email: &str,
    grant_type: &str,
    object_id: Option<&str>,
) -> User {
    let org = directory.seed_organization("Grants holder");
    let team = directory.seed_team(org.id, "Holders");
    let user = directory.seed_user(email, false);
    directory.seed_team_user(team.id, user.id);
    directory.seed_grant(team.id, NewGrant::new(grant_type, object_id));
    user
}

fn team_target(team: Team) -> TeamTarget {
    TeamTarget {
        team,
        member_ids: Vec::new(),
        organization_member_ids: Vec::new(),
    }
}

#[tokio::test]
async fn test_scenario_a_anonymous_listing_is_unauthenticated() {
    let authorizer = Authorizer::new(MockDirectory::new());
    let ctx = AuthContext::anonymous(Method::GET);

    let decision = authorizer
        .authorize(&ctx, ResourceKind::Organization, ResourceAction::List, None)
        .await
        .unwrap();

    assert_eq!(decision, Decision::Deny(DenyReason::Unauthenticated));
}

#[tokio::test]
async fn test_scenario_b_creating_organizations_needs_org_admin() {
    let directory = MockDirectory::new();
    let plain = directory.seed_user("plain@example.org", false);
    let holder = granted(&directory, "holder@example.org", grant_types::ORG_ADMIN, None);
    let authorizer = Authorizer::new(directory);

    let denied = authorizer
        .authorize(
            &context(&plain, Method::POST),
            ResourceKind::Organization,
            ResourceAction::Create,
            None,
        )
        .await
        .unwrap();
    assert_eq!(denied, Decision::Deny(DenyReason::Forbidden));

    let allowed = authorizer
        .authorize(
            &context(&holder, Method::POST),
            ResourceKind::Organization,
            ResourceAction::Create,
            None,
        )
        .await
        .unwrap();
    assert_eq!(allowed, Decision::Allow);
}

#[tokio::test]
async fn test_scenario_c_org_write_is_scoped_to_one_organization() {
    let directory = MockDirectory::new();
    let org_a = directory.seed_organization("A");
    let org_b = directory.seed_organization("B");
    let writer = granted(
        &directory,
        "writer@example.org",
        grant_types::ORG_WRITE,
        Some(&org_a.id.to_string()),
    );
    let authorizer = Authorizer::new(directory);
    let ctx = context(&writer, Method::PUT);

    let on_b = authorizer
        .authorize(
            &ctx,
            ResourceKind::Organization,
            ResourceAction::Update,
            Some(Target::Organization(&org_b)),
        )
        .await
        .unwrap();
    assert_eq!(on_b, Decision::Deny(DenyReason::Forbidden));

    let on_a = authorizer
        .authorize(
            &ctx,
            ResourceKind::Organization,
            ResourceAction::Update,
            Some(Target::Organization(&org_a)),
        )
        .await
        .unwrap();
    assert_eq!(on_a, Decision::Allow);
}

#[tokio::test]
async fn test_scenario_d_team_read_allows_get_but_not_delete() {
    let directory = MockDirectory::new();
    let org = directory.seed_organization("Acme");
    let team = directory.seed_team(org.id, "Readers");
    let reader = granted(
        &directory,
        "reader@example.org",
        grant_types::TEAM_READ,
        Some(&team.id.to_string()),
    );
    let authorizer = Authorizer::new(directory);
    let target = team_target(team);

    let get = authorizer
        .authorize(
            &context(&reader, Method::GET),
            ResourceKind::Team,
            ResourceAction::Retrieve,
            Some(Target::Team(&target)),
        )
        .await
        .unwrap();
    assert_eq!(get, Decision::Allow);

    let delete = authorizer
        .authorize(
            &context(&reader, Method::DELETE),
            ResourceKind::Team,
            ResourceAction::Delete,
            Some(Target::Team(&target)),
        )
        .await
        .unwrap();
    assert_eq!(delete, Decision::Deny(DenyReason::Forbidden));
}

#[tokio::test]
async fn test_scenario_e_archiving_organization_voids_its_grants() {
    let directory = MockDirectory::new();
    let org = directory.seed_organization("Acme");
    let team = directory.seed_team(org.id, "Writers");
    let writer = directory.seed_user("writer@example.org", false);
    directory.seed_team_user(team.id, writer.id);
    directory.seed_grant(
        team.id,
        NewGrant::new(grant_types::ORG_WRITE, Some(&org.id.to_string())),
    );

    let authorizer = Authorizer::new(directory.clone());
    let ctx = context(&writer, Method::PUT);
    let target = team_target(team);

    let before = authorizer
        .authorize(
            &ctx,
            ResourceKind::Team,
            ResourceAction::Update,
            Some(Target::Team(&target)),
        )
        .await
        .unwrap();
    assert_eq!(before, Decision::Allow);

    directory.archive_organization(org.id).await.unwrap();

    let after = authorizer
        .authorize(
            &ctx,
            ResourceKind::Team,
            ResourceAction::Update,
            Some(Target::Team(&target)),
        )
        .await
        .unwrap();
    assert_eq!(after, Decision::Deny(DenyReason::Forbidden));
}

#[tokio::test]
async fn test_scenario_f_self_update_cannot_elevate() {
    let directory = MockDirectory::new();
    let user = directory.seed_user("self@example.org", false);
    let authorizer = Authorizer::new(directory);

    let rename = context(&user, Method::PUT).with_body(json!({"first_name": "Ada"}));
    let decision = authorizer
        .authorize(
            &rename,
            ResourceKind::User,
            ResourceAction::Update,
            Some(Target::User(&user)),
        )
        .await
        .unwrap();
    assert_eq!(decision, Decision::Allow);

    let elevate = context(&user, Method::PUT).with_body(json!({"admin": true}));
    let decision = authorizer
        .authorize(
            &elevate,
            ResourceKind::User,
            ResourceAction::Update,
            Some(Target::User(&user)),
        )
        .await
        .unwrap();
    assert_eq!(decision, Decision::Deny(DenyReason::Forbidden));
}

#[tokio::test]
async fn test_admin_overrides_every_object_tree() {
    let directory = MockDirectory::new();
    let admin = directory.seed_user("admin@example.org", true);
    let other = directory.seed_user("other@example.org", true);
    let org = directory.seed_organization("Acme");
    let team = team_target(directory.seed_team(org.id, "Ops"));
    let authorizer = Authorizer::new(directory);

    let on_org = Some(Target::Organization(&org));
    let on_team = Some(Target::Team(&team));
    let on_user = Some(Target::User(&other));
    let cases = [
        (ResourceKind::Organization, ResourceAction::List, None),
        (ResourceKind::Organization, ResourceAction::Create, None),
        (ResourceKind::Organization, ResourceAction::Retrieve, on_org),
        (ResourceKind::Organization, ResourceAction::Update, on_org),
        (ResourceKind::Organization, ResourceAction::Delete, on_org),
        (ResourceKind::Organization, ResourceAction::ListTeams, on_org),
        (ResourceKind::Organization, ResourceAction::AddMember, on_org),
        (ResourceKind::Organization, ResourceAction::RemoveMember, on_org),
        (ResourceKind::Organization, ResourceAction::CreateTeam, on_org),
        (ResourceKind::Team, ResourceAction::List, None),
        (ResourceKind::Team, ResourceAction::Create, None),
        (ResourceKind::Team, ResourceAction::Retrieve, on_team),
        (ResourceKind::Team, ResourceAction::Update, on_team),
        (ResourceKind::Team, ResourceAction::Delete, on_team),
        (ResourceKind::Team, ResourceAction::AddMember, on_team),
        (ResourceKind::Team, ResourceAction::RemoveMember, on_team),
        (ResourceKind::Team, ResourceAction::AddGrant, on_team),
        (ResourceKind::Team, ResourceAction::RemoveGrant, on_team),
        (ResourceKind::User, ResourceAction::List, None),
        (ResourceKind::User, ResourceAction::Create, None),
        (ResourceKind::User, ResourceAction::Retrieve, on_user),
        (ResourceKind::User, ResourceAction::Update, on_user),
        (ResourceKind::User, ResourceAction::Delete, on_user),
    ];

    for (resource, action, target) in cases {
        let method = match action {
            ResourceAction::List | ResourceAction::Retrieve | ResourceAction::ListTeams => {
                Method::GET
            }
            ResourceAction::Update => Method::PUT,
            ResourceAction::Delete | ResourceAction::RemoveMember | ResourceAction::RemoveGrant => {
                Method::DELETE
            }
            ResourceAction::Create
            | ResourceAction::AddMember
            | ResourceAction::CreateTeam
            | ResourceAction::AddGrant => Method::POST,
        };
        let decision = authorizer
            .authorize(&context(&admin, method.clone()), resource, action, target)
            .await
            .unwrap();
        assert_eq!(decision, Decision::Allow, "{method} {resource} {action}");
    }
}

#[tokio::test]
async fn test_inactive_admin_is_unauthenticated() {
    let directory = MockDirectory::new();
    let mut admin = directory.seed_user("admin@example.org", true);
    admin.is_active = false;
    let authorizer = Authorizer::new(directory);

    let decision = authorizer
        .authorize(
            &context(&admin, Method::GET),
            ResourceKind::Organization,
            ResourceAction::List,
            None,
        )
        .await
        .unwrap();
    assert_eq!(decision, Decision::Deny(DenyReason::Unauthenticated));
}

#[tokio::test]
async fn test_archived_team_voids_its_grants() {
    let directory = MockDirectory::new();
    let org = directory.seed_organization("Acme");
    let holder_team = directory.seed_team(org.id, "Admins");
    let holder = directory.seed_user("holder@example.org", false);
    directory.seed_team_user(holder_team.id, holder.id);
    directory.seed_grant(
        holder_team.id,
        NewGrant::new(grant_types::ORG_ADMIN, Some(&org.id.to_string())),
    );
    let authorizer = Authorizer::new(directory.clone());
    let ctx = context(&holder, Method::DELETE);

    let before = authorizer
        .authorize(
            &ctx,
            ResourceKind::Organization,
            ResourceAction::Delete,
            Some(Target::Organization(&org)),
        )
        .await
        .unwrap();
    assert_eq!(before, Decision::Allow);

    directory.archive_team(holder_team.id).await.unwrap();

    let after = authorizer
        .authorize(
            &ctx,
            ResourceKind::Organization,
            ResourceAction::Delete,
            Some(Target::Organization(&org)),
        )
        .await
        .unwrap();
    assert_eq!(after, Decision::Deny(DenyReason::Forbidden));
}

#[tokio::test]
async fn test_repeated_decisions_are_identical() {
    let directory = MockDirectory::new();
    let org = directory.seed_organization("Acme");
    let writer = granted(
        &directory,
        "writer@example.org",
        grant_types::ORG_WRITE,
        Some(&org.id.to_string()),
    );
    let authorizer = Authorizer::new(directory);
    let ctx = context(&writer, Method::PATCH);

    let mut decisions = Vec::new();
    for _ in 0..3 {
        decisions.push(
            authorizer
                .authorize(
                    &ctx,
                    ResourceKind::Organization,
                    ResourceAction::Update,
                    Some(Target::Organization(&org)),
                )
                .await
                .unwrap(),
        );
    }
    assert!(decisions.iter().all(|d| *d == Decision::Allow));
}

#[tokio::test]
async fn test_membership_changes_apply_on_next_check() {
    let directory = MockDirectory::new();
    let org = directory.seed_organization("Acme");
    let team = directory.seed_team(org.id, "Writers");
    directory.seed_grant(
        team.id,
        NewGrant::new(grant_types::ORG_WRITE, Some(&org.id.to_string())),
    );
    let user = directory.seed_user("late@example.org", false);
    let authorizer = Authorizer::new(directory.clone());
    let ctx = context(&user, Method::PUT);
    let target = Some(Target::Organization(&org));

    let before = authorizer
        .authorize(&ctx, ResourceKind::Organization, ResourceAction::Update, target)
        .await
        .unwrap();
    assert_eq!(before, Decision::Deny(DenyReason::Forbidden));

    directory.add_team_user(team.id, user.id).await.unwrap();

    let after = authorizer
        .authorize(&ctx, ResourceKind::Organization, ResourceAction::Update, target)
        .await
        .unwrap();
    assert_eq!(after, Decision::Allow);
}
