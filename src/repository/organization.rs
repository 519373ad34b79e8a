use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AuthError;

use super::filter::ArchivedFilter;
use super::user::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub title: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait OrganizationRepository {
    async fn find_organization(&self, id: i64) -> Result<Option<Organization>, AuthError>;
    async fn list_organizations(
        &self,
        filter: ArchivedFilter,
    ) -> Result<Vec<Organization>, AuthError>;
    async fn create_organization(&self, title: &str) -> Result<Organization, AuthError>;
    async fn update_organization(&self, id: i64, title: &str) -> Result<Organization, AuthError>;
    /// Soft delete. Archived organizations stay retrievable by id.
    async fn archive_organization(&self, id: i64) -> Result<(), AuthError>;
    /// Adding an existing member is a no-op.
    async fn add_organization_user(&self, organization_id: i64, user_id: i64)
    -> Result<(), AuthError>;
    async fn remove_organization_user(
        &self,
        organization_id: i64,
        user_id: i64,
    ) -> Result<(), AuthError>;
    /// All members, active or not.
    async fn organization_members(&self, organization_id: i64) -> Result<Vec<User>, AuthError>;
}
