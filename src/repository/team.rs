use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AuthError;

use super::filter::ArchivedFilter;
use super::user::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub title: String,
    pub organization_id: i64,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub title: String,
    pub organization_id: i64,
}

/// Listing filter for teams.
///
/// `permission_contains` matches a substring of any grant type on the team,
/// `object_id` an exact grant object id. Both must hit the same grant.
#[derive(Debug, Clone, Default)]
pub struct TeamFilter {
    pub archived: ArchivedFilter,
    pub organization_id: Option<i64>,
    pub permission_contains: Option<String>,
    pub object_id: Option<String>,
}

#[async_trait]
pub trait TeamRepository {
    async fn find_team(&self, id: i64) -> Result<Option<Team>, AuthError>;
    async fn list_teams(&self, filter: &TeamFilter) -> Result<Vec<Team>, AuthError>;
    /// Fails with `NotFound` when the organization does not exist.
    async fn create_team(&self, team: CreateTeam) -> Result<Team, AuthError>;
    async fn update_team(&self, id: i64, title: &str) -> Result<Team, AuthError>;
    async fn archive_team(&self, id: i64) -> Result<(), AuthError>;
    async fn add_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AuthError>;
    async fn remove_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AuthError>;
    /// All members, active or not.
    async fn team_members(&self, team_id: i64) -> Result<Vec<User>, AuthError>;
}
