use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::user::UserRecord;
use super::{PostgresDirectory, database_error, write_error};
use crate::{AuthError, CreateTeam, Team, TeamFilter, TeamRepository, User};

#[derive(FromRow)]
pub(super) struct TeamRecord {
    id: i64,
    title: String,
    organization_id: i64,
    archived: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TeamRecord> for Team {
    fn from(row: TeamRecord) -> Self {
        Team {
            id: row.id,
            title: row.title,
            organization_id: row.organization_id,
            archived: row.archived,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl TeamRepository for PostgresDirectory {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_team(&self, id: i64) -> Result<Option<Team>, AuthError> {
        let row: Option<TeamRecord> = sqlx::query_as(
            r"
            SELECT id, title, organization_id, archived, created_at, updated_at
            FROM teams WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_team", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list_teams(&self, filter: &TeamFilter) -> Result<Vec<Team>, AuthError> {
        // the grant filters must hit the same grant row
        let rows: Vec<TeamRecord> = sqlx::query_as(
            r"
            SELECT t.id, t.title, t.organization_id, t.archived, t.created_at, t.updated_at
            FROM teams t
            WHERE ($1::boolean IS NULL OR t.archived = $1)
              AND ($2::bigint IS NULL OR t.organization_id = $2)
              AND (
                  ($3::text IS NULL AND $4::text IS NULL)
                  OR EXISTS (
                      SELECT 1 FROM grants g
                      WHERE g.team_id = t.id
                        AND ($3::text IS NULL OR strpos(g.type, $3) > 0)
                        AND ($4::text IS NULL OR g.object_id = $4)
                  )
              )
            ORDER BY t.id
            ",
        )
        .bind(filter.archived.as_bool())
        .bind(filter.organization_id)
        .bind(filter.permission_contains.as_deref())
        .bind(filter.object_id.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("list_teams", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create_team(&self, team: CreateTeam) -> Result<Team, AuthError> {
        let row: TeamRecord = sqlx::query_as(
            r"
            INSERT INTO teams (title, organization_id) VALUES ($1, $2)
            RETURNING id, title, organization_id, archived, created_at, updated_at
            ",
        )
        .bind(&team.title)
        .bind(team.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("create_team", &e))?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_team(&self, id: i64, title: &str) -> Result<Team, AuthError> {
        let row: Option<TeamRecord> = sqlx::query_as(
            r"
            UPDATE teams SET title = $1, updated_at = NOW() WHERE id = $2
            RETURNING id, title, organization_id, archived, created_at, updated_at
            ",
        )
        .bind(title)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("update_team", &e))?;

        row.map(Into::into).ok_or(AuthError::NotFound)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn archive_team(&self, id: i64) -> Result<(), AuthError> {
        let result =
            sqlx::query("UPDATE teams SET archived = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| database_error("archive_team", &e))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn add_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO team_users (team_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("add_team_user", &e))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn remove_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM team_users WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("remove_team_user", &e))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn team_members(&self, team_id: i64) -> Result<Vec<User>, AuthError> {
        let rows: Vec<UserRecord> = sqlx::query_as(
            r"
            SELECT u.id, u.email, u.first_name, u.last_name, u.hashed_password, u.is_admin,
                   u.is_active, u.created_at, u.updated_at
            FROM users u
            JOIN team_users tu ON tu.user_id = u.id
            WHERE tu.team_id = $1
            ORDER BY u.id
            ",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("team_members", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
