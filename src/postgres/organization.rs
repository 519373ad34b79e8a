use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::user::UserRecord;
use super::{PostgresDirectory, database_error, write_error};
use crate::{ArchivedFilter, AuthError, Organization, OrganizationRepository, User};

#[derive(FromRow)]
pub(super) struct OrganizationRecord {
    id: i64,
    title: String,
    archived: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrganizationRecord> for Organization {
    fn from(row: OrganizationRecord) -> Self {
        Organization {
            id: row.id,
            title: row.title,
            archived: row.archived,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl OrganizationRepository for PostgresDirectory {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_organization(&self, id: i64) -> Result<Option<Organization>, AuthError> {
        let row: Option<OrganizationRecord> = sqlx::query_as(
            "SELECT id, title, archived, created_at, updated_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_organization", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list_organizations(
        &self,
        filter: ArchivedFilter,
    ) -> Result<Vec<Organization>, AuthError> {
        let rows: Vec<OrganizationRecord> = sqlx::query_as(
            r"
            SELECT id, title, archived, created_at, updated_at
            FROM organizations
            WHERE ($1::boolean IS NULL OR archived = $1)
            ORDER BY id
            ",
        )
        .bind(filter.as_bool())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("list_organizations", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create_organization(&self, title: &str) -> Result<Organization, AuthError> {
        let row: OrganizationRecord = sqlx::query_as(
            r"
            INSERT INTO organizations (title) VALUES ($1)
            RETURNING id, title, archived, created_at, updated_at
            ",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("create_organization", &e))?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_organization(&self, id: i64, title: &str) -> Result<Organization, AuthError> {
        let row: Option<OrganizationRecord> = sqlx::query_as(
            r"
            UPDATE organizations SET title = $1, updated_at = NOW() WHERE id = $2
            RETURNING id, title, archived, created_at, updated_at
            ",
        )
        .bind(title)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("update_organization", &e))?;

        row.map(Into::into).ok_or(AuthError::NotFound)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn archive_organization(&self, id: i64) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE organizations SET archived = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("archive_organization", &e))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn add_organization_user(
        &self,
        organization_id: i64,
        user_id: i64,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r"
            INSERT INTO organization_users (organization_id, user_id) VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(organization_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("add_organization_user", &e))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn remove_organization_user(
        &self,
        organization_id: i64,
        user_id: i64,
    ) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM organization_users WHERE organization_id = $1 AND user_id = $2")
            .bind(organization_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("remove_organization_user", &e))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn organization_members(&self, organization_id: i64) -> Result<Vec<User>, AuthError> {
        let rows: Vec<UserRecord> = sqlx::query_as(
            r"
            SELECT u.id, u.email, u.first_name, u.last_name, u.hashed_password, u.is_admin,
                   u.is_active, u.created_at, u.updated_at
            FROM users u
            JOIN organization_users ou ON ou.user_id = u.id
            WHERE ou.organization_id = $1
            ORDER BY u.id
            ",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("organization_members", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
