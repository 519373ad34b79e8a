use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use super::{
    RequestBody, actor, choice, referenced_user, required, required_title, title_update,
};
use crate::api::axum::error::AppError;
use crate::api::axum::middleware::Caller;
use crate::api::axum::routes::{ApiState, Directory};
use crate::api::{MemberRequest, OrganizationRequest, TeamRequest};
use crate::events::{DirectoryEvent, dispatch};
use crate::permissions::{ResourceAction, ResourceKind};
use crate::{
    ArchivedFilter, CreateTeam, OrganizationRepository, TeamFilter, TeamRepository,
    TokenRepository,
};

/// GET /organizations
pub async fn list<D, T>(
    State(state): State<ApiState<D, T>>,
    caller: Caller,
    method: Method,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Response, AppError>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    let context = caller.context(method, query.clone(), None);
    state
        .authorizer
        .require(&context, ResourceKind::Organization, ResourceAction::List, None)
        .await?;

    let archived: ArchivedFilter = choice(&query, "archived")?;
    let organizations = state.directory.list_organizations(archived).await?;

    let mut body = Vec::with_capacity(organizations.len());
    for organization in organizations {
        body.push(state.organization_response(organization).await?);
    }
    Ok(Json(body).into_response())
}

/// POST /organizations
pub async fn create<D, T>(
    State(state): State<ApiState<D, T>>,
    caller: Caller,
    method: Method,
    body: RequestBody,
) -> Result<Response, AppError>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    let context = caller.context(method, BTreeMap::new(), body.value());
    state
        .authorizer
        .require(
            &context,
            ResourceKind::Organization,
            ResourceAction::Create,
            None,
        )
        .await?;

    let request: OrganizationRequest = body.parse()?;
    let title = required_title(request.title)?;
    let organization = state.directory.create_organization(&title).await?;

    log::info!(
        target: "authgate",
        "msg=\"organization created\", organization_id={}",
        organization.id
    );
    dispatch(DirectoryEvent::OrganizationCreated {
        organization_id: organization.id,
        by: actor(&context),
        at: Utc::now(),
    })
    .await;

    let response = state.organization_response(organization).await?;
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// GET /organizations/{id}
pub async fn retrieve<D, T>(
    State(state): State<ApiState<D, T>>,
    caller: Caller,
    method: Method,
    Path(id): Path<i64>,
) -> Result<Response, AppError>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    let context = caller.context(method, BTreeMap::new(), None);
    let organization = state
        .authorized_organization(&context, ResourceAction::Retrieve, id)
        .await?;
    Ok(Json(state.organization_response(organization).await?).into_response())
}

/// PUT and PATCH /organizations/{id}
///
/// PUT requires `title`; PATCH leaves it alone when absent.
pub async fn update<D, T>(
    State(state): State<ApiState<D, T>>,
    caller: Caller,
    method: Method,
    Path(id): Path<i64>,
    body: RequestBody,
) -> Result<Response, AppError>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    let partial = method == Method::PATCH;
    let context = caller.context(method, BTreeMap::new(), body.value());
    let mut organization = state
        .authorized_organization(&context, ResourceAction::Update, id)
        .await?;

    let request: OrganizationRequest = body.parse()?;
    if let Some(title) = title_update(request.title, partial)? {
        organization = state.directory.update_organization(id, &title).await?;
        log::info!(
            target: "authgate",
            "msg=\"organization updated\", organization_id={id}"
        );
    }

    Ok(Json(state.organization_response(organization).await?).into_response())
}

/// DELETE /organizations/{id}
///
/// Archives; the row stays retrievable by id.
pub async fn archive<D, T>(
    State(state): State<ApiState<D, T>>,
    caller: Caller,
    method: Method,
    Path(id): Path<i64>,
) -> Result<Response, AppError>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    let context = caller.context(method, BTreeMap::new(), None);
    state
        .authorized_organization(&context, ResourceAction::Delete, id)
        .await?;

    state.directory.archive_organization(id).await?;

    log::info!(
        target: "authgate",
        "msg=\"organization archived\", organization_id={id}"
    );
    dispatch(DirectoryEvent::OrganizationArchived {
        organization_id: id,
        by: actor(&context),
        at: Utc::now(),
    })
    .await;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// GET /organizations/{id}/teams
///
/// Only teams the caller may read are listed.
pub async fn list_teams<D, T>(
    State(state): State<ApiState<D, T>>,
    caller: Caller,
    method: Method,
    Path(id): Path<i64>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Response, AppError>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    let context = caller.context(method, query.clone(), None);
    state
        .authorized_organization(&context, ResourceAction::ListTeams, id)
        .await?;

    let filter = TeamFilter {
        archived: choice(&query, "archived")?,
        organization_id: Some(id),
        ..TeamFilter::default()
    };
    let teams = state.directory.list_teams(&filter).await?;
    let teams = state.visible_teams(&context, teams).await?;

    let mut body = Vec::with_capacity(teams.len());
    for team in teams {
        body.push(state.team_response(team).await?);
    }
    Ok(Json(body).into_response())
}

/// POST /organizations/{id}/teams
pub async fn create_team<D, T>(
    State(state): State<ApiState<D, T>>,
    caller: Caller,
    method: Method,
    Path(id): Path<i64>,
    body: RequestBody,
) -> Result<Response, AppError>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    let context = caller.context(method, BTreeMap::new(), body.value());
    state
        .authorized_organization(&context, ResourceAction::CreateTeam, id)
        .await?;

    let request: TeamRequest = body.parse()?;
    let title = required_title(request.title)?;
    let team = state
        .directory
        .create_team(CreateTeam {
            title,
            organization_id: id,
        })
        .await?;

    log::info!(
        target: "authgate",
        "msg=\"team created\", team_id={}, organization_id={id}",
        team.id
    );
    dispatch(DirectoryEvent::TeamCreated {
        team_id: team.id,
        organization_id: id,
        by: actor(&context),
        at: Utc::now(),
    })
    .await;

    let response = state.team_response(team).await?;
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// POST /organizations/{id}/users
pub async fn add_user<D, T>(
    State(state): State<ApiState<D, T>>,
    caller: Caller,
    method: Method,
    Path(id): Path<i64>,
    body: RequestBody,
) -> Result<Response, AppError>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    let context = caller.context(method, BTreeMap::new(), body.value());
    state
        .authorized_organization(&context, ResourceAction::AddMember, id)
        .await?;

    let request: MemberRequest = body.parse()?;
    let user_id = required(request.user_id, "user_id")?;
    let user = referenced_user(&state.directory, user_id).await?;
    state.directory.add_organization_user(id, user.id).await?;

    log::info!(
        target: "authgate",
        "msg=\"organization member added\", organization_id={id}, user_id={}",
        user.id
    );
    dispatch(DirectoryEvent::MemberAdded {
        resource: ResourceKind::Organization,
        resource_id: id,
        user_id: user.id,
        at: Utc::now(),
    })
    .await;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /organizations/{id}/users/{user_id}
pub async fn remove_user<D, T>(
    State(state): State<ApiState<D, T>>,
    caller: Caller,
    method: Method,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<Response, AppError>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    let context = caller.context(method, BTreeMap::new(), None);
    state
        .authorized_organization(&context, ResourceAction::RemoveMember, id)
        .await?;

    state.directory.remove_organization_user(id, user_id).await?;

    log::info!(
        target: "authgate",
        "msg=\"organization member removed\", organization_id={id}, user_id={user_id}"
    );
    dispatch(DirectoryEvent::MemberRemoved {
        resource: ResourceKind::Organization,
        resource_id: id,
        user_id,
        at: Utc::now(),
    })
    .await;

    Ok(StatusCode::NO_CONTENT.into_response())
}
