use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use super::{RequestBody, actor, choice, referenced_user, required, title_update};
use crate::api::axum::error::AppError;
use crate::api::axum::middleware::Caller;
use crate::api::axum::routes::{ApiState, Directory};
use crate::api::{GrantRequest, MemberRequest, TeamRequest};
use crate::events::{DirectoryEvent, dispatch};
use crate::permissions::{ResourceAction, ResourceKind};
use crate::validators::ValidationError;
use crate::{AuthError, GrantRepository, NewGrant, TeamFilter, TeamRepository, TokenRepository};

/// GET /teams
///
/// `archived`, `permission_contains` and `object_id` narrow the rows; the
/// result then keeps only teams the caller may read.
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
        .require(&context, ResourceKind::Team, ResourceAction::List, None)
        .await?;

    let filter = TeamFilter {
        archived: choice(&query, "archived")?,
        organization_id: None,
        permission_contains: query.get("permission_contains").cloned(),
        object_id: query.get("object_id").cloned(),
    };
    let teams = state.directory.list_teams(&filter).await?;
    let teams = state.visible_teams(&context, teams).await?;

    let mut body = Vec::with_capacity(teams.len());
    for team in teams {
        body.push(state.team_response(team).await?);
    }
    Ok(Json(body).into_response())
}

/// GET /teams/{id}
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
    let target = state
        .authorized_team(&context, ResourceAction::Retrieve, id)
        .await?;
    Ok(Json(state.team_response(target.team).await?).into_response())
}

/// PUT and PATCH /teams/{id}
///
/// A team never moves between organizations.
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
    let mut team = state
        .authorized_team(&context, ResourceAction::Update, id)
        .await?
        .team;

    if body.contains_key("organization") {
        return Err(AuthError::Validation(ValidationError::ImmutableField("organization")).into());
    }

    let request: TeamRequest = body.parse()?;
    if let Some(title) = title_update(request.title, partial)? {
        team = state.directory.update_team(id, &title).await?;
        log::info!(target: "authgate", "msg=\"team updated\", team_id={id}");
    }

    Ok(Json(state.team_response(team).await?).into_response())
}

/// DELETE /teams/{id}
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
        .authorized_team(&context, ResourceAction::Delete, id)
        .await?;

    state.directory.archive_team(id).await?;

    log::info!(target: "authgate", "msg=\"team archived\", team_id={id}");
    dispatch(DirectoryEvent::TeamArchived {
        team_id: id,
        by: actor(&context),
        at: Utc::now(),
    })
    .await;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// POST /teams/{id}/users
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
        .authorized_team(&context, ResourceAction::AddMember, id)
        .await?;

    let request: MemberRequest = body.parse()?;
    let user_id = required(request.user_id, "user_id")?;
    let user = referenced_user(&state.directory, user_id).await?;
    state.directory.add_team_user(id, user.id).await?;

    log::info!(
        target: "authgate",
        "msg=\"team member added\", team_id={id}, user_id={}",
        user.id
    );
    dispatch(DirectoryEvent::MemberAdded {
        resource: ResourceKind::Team,
        resource_id: id,
        user_id: user.id,
        at: Utc::now(),
    })
    .await;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /teams/{id}/users/{user_id}
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
        .authorized_team(&context, ResourceAction::RemoveMember, id)
        .await?;

    state.directory.remove_team_user(id, user_id).await?;

    log::info!(
        target: "authgate",
        "msg=\"team member removed\", team_id={id}, user_id={user_id}"
    );
    dispatch(DirectoryEvent::MemberRemoved {
        resource: ResourceKind::Team,
        resource_id: id,
        user_id,
        at: Utc::now(),
    })
    .await;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// POST /teams/{id}/permissions
pub async fn add_permission<D, T>(
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
        .authorized_team(&context, ResourceAction::AddGrant, id)
        .await?;

    let request: GrantRequest = body.parse()?;
    let grant_type = required(request.grant_type.filter(|t| !t.is_empty()), "type")?;
    let grant = state
        .directory
        .add_team_grant(
            id,
            NewGrant {
                grant_type,
                object_id: request.object_id,
                namespace: request.namespace,
            },
        )
        .await?;

    log::info!(
        target: "authgate",
        "msg=\"grant added\", team_id={id}, grant_id={}, type={}",
        grant.id,
        grant.grant_type
    );
    dispatch(DirectoryEvent::GrantAdded {
        team_id: id,
        grant_id: grant.id,
        grant_type: grant.grant_type.clone(),
        at: Utc::now(),
    })
    .await;

    Ok((StatusCode::CREATED, Json(grant)).into_response())
}

/// DELETE /teams/{id}/permissions/{permission_id}
pub async fn remove_permission<D, T>(
    State(state): State<ApiState<D, T>>,
    caller: Caller,
    method: Method,
    Path((id, permission_id)): Path<(i64, i64)>,
) -> Result<Response, AppError>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    let context = caller.context(method, BTreeMap::new(), None);
    state
        .authorized_team(&context, ResourceAction::RemoveGrant, id)
        .await?;

    state.directory.remove_team_grant(id, permission_id).await?;

    log::info!(
        target: "authgate",
        "msg=\"grant removed\", team_id={id}, grant_id={permission_id}"
    );
    dispatch(DirectoryEvent::GrantRemoved {
        team_id: id,
        grant_id: permission_id,
        at: Utc::now(),
    })
    .await;

    Ok(StatusCode::NO_CONTENT.into_response())
}
