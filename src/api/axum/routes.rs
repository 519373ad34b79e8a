use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};

use super::handlers::{organizations, teams, tokens, users};
use crate::config::AuthGateConfig;
use crate::permissions::{Authorizer, GrantStore};
use crate::{
    GrantRepository, OrganizationRepository, TeamRepository, TokenRepository, UserRepository,
};

/// Everything the handlers need from storage, in one bound.
pub trait Directory:
    UserRepository
    + OrganizationRepository
    + TeamRepository
    + GrantRepository
    + GrantStore
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<D> Directory for D where
    D: UserRepository
        + OrganizationRepository
        + TeamRepository
        + GrantRepository
        + GrantStore
        + Clone
        + Send
        + Sync
        + 'static
{
}

#[derive(Clone)]
pub struct ApiState<D, T> {
    pub directory: D,
    pub token_repo: T,
    pub authorizer: Authorizer<D>,
    pub config: Arc<AuthGateConfig>,
}

impl<D: Directory, T> ApiState<D, T> {
    /// The authorizer reads grants from `directory`.
    pub fn new(directory: D, token_repo: T, config: AuthGateConfig) -> Self {
        Self {
            authorizer: Authorizer::new(directory.clone()),
            directory,
            token_repo,
            config: Arc::new(config),
        }
    }
}

/// All directory endpoints. `/teams` has no POST: teams are created under
/// their organization.
pub fn directory_routes<D, T>() -> Router<ApiState<D, T>>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/tokens", post(tokens::issue_token::<D, T>))
        .merge(organization_routes())
        .merge(team_routes())
        .merge(user_routes())
}

pub fn organization_routes<D, T>() -> Router<ApiState<D, T>>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/organizations",
            get(organizations::list::<D, T>).post(organizations::create::<D, T>),
        )
        .route(
            "/organizations/{id}",
            get(organizations::retrieve::<D, T>)
                .put(organizations::update::<D, T>)
                .patch(organizations::update::<D, T>)
                .delete(organizations::archive::<D, T>),
        )
        .route(
            "/organizations/{id}/teams",
            get(organizations::list_teams::<D, T>).post(organizations::create_team::<D, T>),
        )
        .route(
            "/organizations/{id}/users",
            post(organizations::add_user::<D, T>),
        )
        .route(
            "/organizations/{id}/users/{user_id}",
            delete(organizations::remove_user::<D, T>),
        )
}

pub fn team_routes<D, T>() -> Router<ApiState<D, T>>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/teams", get(teams::list::<D, T>))
        .route(
            "/teams/{id}",
            get(teams::retrieve::<D, T>)
                .put(teams::update::<D, T>)
                .patch(teams::update::<D, T>)
                .delete(teams::archive::<D, T>),
        )
        .route("/teams/{id}/users", post(teams::add_user::<D, T>))
        .route(
            "/teams/{id}/users/{user_id}",
            delete(teams::remove_user::<D, T>),
        )
        .route(
            "/teams/{id}/permissions",
            post(teams::add_permission::<D, T>),
        )
        .route(
            "/teams/{id}/permissions/{permission_id}",
            delete(teams::remove_permission::<D, T>),
        )
}

pub fn user_routes<D, T>() -> Router<ApiState<D, T>>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/users", get(users::list::<D, T>).post(users::create::<D, T>))
        .route(
            "/users/{id}",
            get(users::retrieve::<D, T>)
                .put(users::update::<D, T>)
                .patch(users::update::<D, T>)
                .delete(users::deactivate::<D, T>),
        )
}
