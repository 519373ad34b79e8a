use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// A permission attached to a team, e.g. `org:admin` on organization `"3"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: i64,
    pub team_id: i64,
    #[serde(rename = "type")]
    pub grant_type: String,
    pub object_id: Option<String>,
    pub namespace: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGrant {
    #[serde(rename = "type")]
    pub grant_type: String,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub namespace: String,
}

impl NewGrant {
    pub fn new(grant_type: impl Into<String>, object_id: Option<&str>) -> Self {
        Self {
            grant_type: grant_type.into(),
            object_id: object_id.map(str::to_owned),
            namespace: String::new(),
        }
    }
}

/// Grant rows per team, for the team representation and its nested
/// permission endpoints.
#[async_trait]
pub trait GrantRepository {
    async fn team_grants(&self, team_id: i64) -> Result<Vec<Grant>, AuthError>;
    async fn add_team_grant(&self, team_id: i64, grant: NewGrant) -> Result<Grant, AuthError>;
    /// Fails with `NotFound` when the grant is not attached to the team.
    async fn remove_team_grant(&self, team_id: i64, grant_id: i64) -> Result<(), AuthError>;
}
