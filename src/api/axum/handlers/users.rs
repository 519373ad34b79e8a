use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use super::{RequestBody, actor, choice, required};
use crate::actions::CreateUserAction;
use crate::api::axum::error::AppError;
use crate::api::axum::middleware::Caller;
use crate::api::axum::routes::{ApiState, Directory};
use crate::api::{CreateUserRequest, UpdateUserRequest};
use crate::config::AuthGateConfig;
use crate::crypto::PasswordHasher;
use crate::events::{DirectoryEvent, dispatch};
use crate::permissions::{ResourceAction, ResourceKind};
use crate::validators::validate_email;
use crate::{ActiveFilter, AuthError, TokenRepository, User, UserChanges, UserRepository};

/// GET /users
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
        .require(&context, ResourceKind::User, ResourceAction::List, None)
        .await?;

    let active: ActiveFilter = choice(&query, "active")?;
    let users = state.directory.list_users(active).await?;

    let mut body = Vec::with_capacity(users.len());
    for user in users {
        body.push(state.user_response(user).await?);
    }
    Ok(Json(body).into_response())
}

/// POST /users
///
/// Only admins may create another admin.
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
        .require(&context, ResourceKind::User, ResourceAction::Create, None)
        .await?;

    let request: CreateUserRequest = body.parse()?;
    let email = required(request.email, "email")?;
    let password = required(request.password, "password")?;

    let config = AuthGateConfig::clone(&state.config);
    let action = CreateUserAction::new(state.directory.clone(), config);
    let user = action
        .execute(
            &email,
            password.expose_secret(),
            &request.first_name,
            &request.last_name,
            request.admin,
        )
        .await?;

    let response = state.user_response(user).await?;
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// GET /users/{id}
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
    let user = state
        .authorized_user(&context, ResourceAction::Retrieve, id)
        .await?;
    Ok(Json(state.user_response(user).await?).into_response())
}

/// PUT and PATCH /users/{id}
///
/// Absent fields are left alone; `password` resets it.
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
    let context = caller.context(method, BTreeMap::new(), body.value());
    let user = state
        .authorized_user(&context, ResourceAction::Update, id)
        .await?;

    let request: UpdateUserRequest = body.parse()?;
    let changes = user_changes(&state.directory, &state.config, &user, request).await?;
    let deactivating = user.is_active && changes.is_active == Some(false);

    let user = state.directory.update_user(id, changes).await?;
    log::info!(target: "authgate", "msg=\"user updated\", user_id={id}");

    if deactivating {
        deactivated(&state, id, actor(&context)).await?;
    }

    Ok(Json(state.user_response(user).await?).into_response())
}

/// DELETE /users/{id}
///
/// Deactivates the account and revokes its tokens; the row is kept.
pub async fn deactivate<D, T>(
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
        .authorized_user(&context, ResourceAction::Delete, id)
        .await?;

    state.directory.deactivate_user(id).await?;
    deactivated(&state, id, actor(&context)).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn user_changes<D: Directory>(
    directory: &D,
    config: &AuthGateConfig,
    user: &User,
    request: UpdateUserRequest,
) -> Result<UserChanges, AuthError> {
    if let Some(email) = &request.email {
        validate_email(email)?;
        if *email != user.email && directory.find_user_by_email(email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }
    }

    let hashed_password = match &request.password {
        Some(password) => {
            config.password.policy().validate(password.expose_secret())?;
            Some(config.password.hasher().hash(password.expose_secret())?)
        }
        None => None,
    };

    Ok(UserChanges {
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        hashed_password,
        is_admin: request.admin,
        is_active: request.active,
    })
}

async fn deactivated<D, T>(state: &ApiState<D, T>, user_id: i64, by: i64) -> Result<(), AuthError>
where
    D: Directory,
    T: TokenRepository,
{
    state.token_repo.revoke_all_user_tokens(user_id).await?;

    log::info!(target: "authgate", "msg=\"user deactivated\", user_id={user_id}, by={by}");
    dispatch(DirectoryEvent::UserDeactivated {
        user_id,
        by,
        at: Utc::now(),
    })
    .await;
    Ok(())
}
