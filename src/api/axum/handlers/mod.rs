//! Directory handlers.
//!
//! Every instance handler runs the same sequence: anonymous callers are
//! turned away first (401), then the target is loaded (404), the policy is
//! checked (403) and only then is the body validated (400).

pub mod organizations;
pub mod teams;
pub mod tokens;
pub mod users;

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::AppError;
use super::routes::{ApiState, Directory};
use crate::api::{OrganizationResponse, TeamResponse, UserResponse};
use crate::permissions::{AuthContext, ResourceAction, ResourceKind, Target, TeamTarget};
use crate::validators::{ValidationError, validate_title};
use crate::{
    AuthError, GrantRepository, Organization, OrganizationRepository, Team, TeamFilter,
    TeamRepository, User, UserRepository,
};

/// A JSON body whose parse error is held back until after authorization.
///
/// An empty body reads as `{}`.
#[derive(Debug)]
pub struct RequestBody(Result<Value, ValidationError>);

impl RequestBody {
    fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self(Ok(Value::Object(Map::new())));
        }
        Self(
            serde_json::from_slice(bytes)
                .map_err(|e| ValidationError::InvalidBody(e.to_string())),
        )
    }

    /// The body as the rule engine sees it; `None` when it did not parse.
    pub fn value(&self) -> Option<Value> {
        self.0.as_ref().ok().cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        matches!(&self.0, Ok(Value::Object(map)) if map.contains_key(key))
    }

    /// # Errors
    ///
    /// `Validation(InvalidBody)` for malformed JSON or a shape mismatch.
    pub fn parse<B: DeserializeOwned>(self) -> Result<B, AuthError> {
        let value = self.0?;
        serde_json::from_value(value)
            .map_err(|e| AuthError::Validation(ValidationError::InvalidBody(e.to_string())))
    }
}

impl<S: Send + Sync> FromRequest<S> for RequestBody {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            AppError(AuthError::Validation(ValidationError::InvalidBody(
                e.body_text(),
            )))
        })?;
        Ok(Self::from_bytes(&bytes))
    }
}

/// Reads a fixed-choice query parameter, falling back to its default.
pub(crate) fn choice<F>(query: &BTreeMap<String, String>, key: &str) -> Result<F, AuthError>
where
    F: FromStr<Err = ValidationError> + Default,
{
    match query.get(key) {
        Some(value) => Ok(value.parse()?),
        None => Ok(F::default()),
    }
}

pub(crate) fn required<V>(value: Option<V>, field: &'static str) -> Result<V, AuthError> {
    value.ok_or(AuthError::Validation(ValidationError::Required(field)))
}

pub(crate) fn required_title(title: Option<String>) -> Result<String, AuthError> {
    let title = required(title, "title")?;
    validate_title(&title)?;
    Ok(title)
}

/// PUT must carry a title; PATCH may leave it out.
pub(crate) fn title_update(
    title: Option<String>,
    partial: bool,
) -> Result<Option<String>, AuthError> {
    match title {
        None if partial => Ok(None),
        title => required_title(title).map(Some),
    }
}

/// Whoever the context authenticated; only called once the gate allowed.
pub(crate) fn actor(context: &AuthContext) -> i64 {
    context.principal_id().unwrap_or_default()
}

/// A user named in a request body. A dangling id is a 400, not a 404.
pub(crate) async fn referenced_user<D: Directory>(
    directory: &D,
    user_id: i64,
) -> Result<User, AuthError> {
    directory
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| {
            AuthError::Validation(ValidationError::MissingObject {
                field: "user_id",
                pk: user_id.to_string(),
            })
        })
}

fn active(users: Vec<User>) -> Vec<User> {
    users.into_iter().filter(|u| u.is_active).collect()
}

fn ids(users: &[User]) -> Vec<i64> {
    users.iter().map(|u| u.id).collect()
}

impl<D: Directory, T> ApiState<D, T> {
    /// Answers 401 for anonymous or inactive callers without reading grants
    /// or the target.
    async fn authenticate(
        &self,
        context: &AuthContext,
        resource: ResourceKind,
        action: ResourceAction,
    ) -> Result<(), AuthError> {
        if context.authenticated().is_none() {
            self.authorizer.require(context, resource, action, None).await?;
        }
        Ok(())
    }

    pub(crate) async fn authorized_organization(
        &self,
        context: &AuthContext,
        action: ResourceAction,
        id: i64,
    ) -> Result<Organization, AuthError> {
        self.authenticate(context, ResourceKind::Organization, action)
            .await?;
        let organization = self
            .directory
            .find_organization(id)
            .await?
            .ok_or(AuthError::NotFound)?;
        self.authorizer
            .require(
                context,
                ResourceKind::Organization,
                action,
                Some(Target::Organization(&organization)),
            )
            .await?;
        Ok(organization)
    }

    pub(crate) async fn authorized_team(
        &self,
        context: &AuthContext,
        action: ResourceAction,
        id: i64,
    ) -> Result<TeamTarget, AuthError> {
        self.authenticate(context, ResourceKind::Team, action).await?;
        let team = self
            .directory
            .find_team(id)
            .await?
            .ok_or(AuthError::NotFound)?;
        let target = self.team_target(team).await?;
        self.authorizer
            .require(context, ResourceKind::Team, action, Some(Target::Team(&target)))
            .await?;
        Ok(target)
    }

    pub(crate) async fn authorized_user(
        &self,
        context: &AuthContext,
        action: ResourceAction,
        id: i64,
    ) -> Result<User, AuthError> {
        self.authenticate(context, ResourceKind::User, action).await?;
        let user = self
            .directory
            .find_user_by_id(id)
            .await?
            .ok_or(AuthError::NotFound)?;
        self.authorizer
            .require(context, ResourceKind::User, action, Some(Target::User(&user)))
            .await?;
        Ok(user)
    }

    /// A team plus the memberships its policy reads.
    pub(crate) async fn team_target(&self, team: Team) -> Result<TeamTarget, AuthError> {
        let organization_member_ids = self.member_ids_of(team.organization_id).await?;
        self.team_target_with(team, organization_member_ids).await
    }

    async fn member_ids_of(&self, organization_id: i64) -> Result<Vec<i64>, AuthError> {
        Ok(ids(&self.directory.organization_members(organization_id).await?))
    }

    async fn team_target_with(
        &self,
        team: Team,
        organization_member_ids: Vec<i64>,
    ) -> Result<TeamTarget, AuthError> {
        let member_ids = ids(&self.directory.team_members(team.id).await?);
        Ok(TeamTarget {
            team,
            member_ids,
            organization_member_ids,
        })
    }

    /// Keeps the teams the caller may read. One grant read for the batch and
    /// one member read per organization; team members are still read per
    /// team, so a listing costs one query per team plus one per organization.
    pub(crate) async fn visible_teams(
        &self,
        context: &AuthContext,
        teams: Vec<Team>,
    ) -> Result<Vec<Team>, AuthError> {
        let grants = self.authorizer.grants_for(context).await?;
        let policy = &self.authorizer.policies().team;

        let mut organization_members: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        let mut visible = Vec::with_capacity(teams.len());
        for team in teams {
            let members = match organization_members.get(&team.organization_id) {
                Some(members) => members.clone(),
                None => {
                    let members = self.member_ids_of(team.organization_id).await?;
                    organization_members.insert(team.organization_id, members.clone());
                    members
                }
            };
            let target = self.team_target_with(team, members).await?;
            if policy.allows_object(context, &grants, &target) {
                visible.push(target.team);
            }
        }
        Ok(visible)
    }

    pub(crate) async fn organization_response(
        &self,
        organization: Organization,
    ) -> Result<OrganizationResponse, AuthError> {
        let teams = self
            .directory
            .list_teams(&TeamFilter {
                organization_id: Some(organization.id),
                ..TeamFilter::default()
            })
            .await?;
        let users = active(self.directory.organization_members(organization.id).await?);
        Ok(OrganizationResponse::new(organization, &teams, &users))
    }

    pub(crate) async fn team_response(&self, team: Team) -> Result<TeamResponse, AuthError> {
        let permissions = self.directory.team_grants(team.id).await?;
        let users = active(self.directory.team_members(team.id).await?);
        Ok(TeamResponse::new(team, permissions, &users))
    }

    pub(crate) async fn user_response(&self, user: User) -> Result<UserResponse, AuthError> {
        let teams = self.directory.teams_for_user(user.id).await?;
        let organizations = self.directory.organizations_for_user(user.id).await?;
        Ok(UserResponse::new(user, &teams, &organizations))
    }
}
