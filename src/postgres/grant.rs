use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{PostgresDirectory, database_error, write_error};
use crate::permissions::GrantStore;
use crate::{AuthError, Grant, GrantRepository, NewGrant};

#[derive(FromRow)]
struct GrantRecord {
    id: i64,
    team_id: i64,
    grant_type: String,
    object_id: Option<String>,
    namespace: String,
    created_at: DateTime<Utc>,
}

impl From<GrantRecord> for Grant {
    fn from(row: GrantRecord) -> Self {
        Grant {
            id: row.id,
            team_id: row.team_id,
            grant_type: row.grant_type,
            object_id: row.object_id,
            namespace: row.namespace,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl GrantRepository for PostgresDirectory {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn team_grants(&self, team_id: i64) -> Result<Vec<Grant>, AuthError> {
        let rows: Vec<GrantRecord> = sqlx::query_as(
            r"
            SELECT id, team_id, type AS grant_type, object_id, namespace, created_at
            FROM grants WHERE team_id = $1
            ORDER BY id
            ",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("team_grants", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn add_team_grant(&self, team_id: i64, grant: NewGrant) -> Result<Grant, AuthError> {
        let row: GrantRecord = sqlx::query_as(
            r"
            INSERT INTO grants (team_id, type, object_id, namespace) VALUES ($1, $2, $3, $4)
            RETURNING id, team_id, type AS grant_type, object_id, namespace, created_at
            ",
        )
        .bind(team_id)
        .bind(&grant.grant_type)
        .bind(&grant.object_id)
        .bind(&grant.namespace)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("add_team_grant", &e))?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn remove_team_grant(&self, team_id: i64, grant_id: i64) -> Result<(), AuthError> {
        let result = sqlx::query("DELETE FROM grants WHERE id = $1 AND team_id = $2")
            .bind(grant_id)
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("remove_team_grant", &e))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl GrantStore for PostgresDirectory {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn grants_for(&self, user_id: i64) -> Result<Vec<Grant>, AuthError> {
        let rows: Vec<GrantRecord> = sqlx::query_as(
            r"
            SELECT g.id, g.team_id, g.type AS grant_type, g.object_id, g.namespace, g.created_at
            FROM grants g
            JOIN teams t ON t.id = g.team_id
            JOIN organizations o ON o.id = t.organization_id
            JOIN team_users tu ON tu.team_id = t.id
            WHERE tu.user_id = $1 AND NOT t.archived AND NOT o.archived
            ORDER BY g.id
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("grants_for", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn has_grant(
        &self,
        user_id: i64,
        grant_type: &str,
        object_id: Option<&str>,
    ) -> Result<bool, AuthError> {
        let found: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM grants g
                JOIN teams t ON t.id = g.team_id
                JOIN organizations o ON o.id = t.organization_id
                JOIN team_users tu ON tu.team_id = t.id
                WHERE tu.user_id = $1 AND NOT t.archived AND NOT o.archived
                  AND g.type = $2
                  AND ($3::text IS NULL OR g.object_id = $3)
            )
            ",
        )
        .bind(user_id)
        .bind(grant_type)
        .bind(object_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("has_grant", &e))?;

        Ok(found)
    }
}
