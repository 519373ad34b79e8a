use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::organization::OrganizationRecord;
use super::team::TeamRecord;
use super::{PostgresDirectory, database_error, write_error};
use crate::{
    ActiveFilter, AuthError, NewUser, Organization, Team, User, UserChanges, UserRepository,
};

#[derive(FromRow)]
pub(super) struct UserRecord {
    id: i64,
    email: String,
    first_name: String,
    last_name: String,
    hashed_password: String,
    is_admin: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(row: UserRecord) -> Self {
        User {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            hashed_password: row.hashed_password,
            is_admin: row.is_admin,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UserRepository for PostgresDirectory {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let row: Option<UserRecord> = sqlx::query_as(
            r"
            SELECT id, email, first_name, last_name, hashed_password, is_admin, is_active,
                   created_at, updated_at
            FROM users WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_user_by_id", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row: Option<UserRecord> = sqlx::query_as(
            r"
            SELECT id, email, first_name, last_name, hashed_password, is_admin, is_active,
                   created_at, updated_at
            FROM users WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_user_by_email", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list_users(&self, filter: ActiveFilter) -> Result<Vec<User>, AuthError> {
        let rows: Vec<UserRecord> = sqlx::query_as(
            r"
            SELECT id, email, first_name, last_name, hashed_password, is_admin, is_active,
                   created_at, updated_at
            FROM users
            WHERE ($1::boolean IS NULL OR is_active = $1)
            ORDER BY id
            ",
        )
        .bind(filter.as_bool())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("list_users", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, user), err))]
    async fn create_user(&self, user: NewUser) -> Result<User, AuthError> {
        let row: UserRecord = sqlx::query_as(
            r"
            INSERT INTO users (email, hashed_password, first_name, last_name, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, first_name, last_name, hashed_password, is_admin, is_active,
                      created_at, updated_at
            ",
        )
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("create_user", &e))?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, changes), err))]
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, AuthError> {
        let row: Option<UserRecord> = sqlx::query_as(
            r"
            UPDATE users SET
                email = COALESCE($1, email),
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                hashed_password = COALESCE($4, hashed_password),
                is_admin = COALESCE($5, is_admin),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $7
            RETURNING id, email, first_name, last_name, hashed_password, is_admin, is_active,
                      created_at, updated_at
            ",
        )
        .bind(changes.email)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.hashed_password)
        .bind(changes.is_admin)
        .bind(changes.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error("update_user", &e))?;

        row.map(Into::into).ok_or(AuthError::NotFound)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn deactivate_user(&self, id: i64) -> Result<(), AuthError> {
        let result =
            sqlx::query("UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| database_error("deactivate_user", &e))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn teams_for_user(&self, user_id: i64) -> Result<Vec<Team>, AuthError> {
        let rows: Vec<TeamRecord> = sqlx::query_as(
            r"
            SELECT t.id, t.title, t.organization_id, t.archived, t.created_at, t.updated_at
            FROM teams t
            JOIN team_users tu ON tu.team_id = t.id
            WHERE tu.user_id = $1 AND NOT t.archived
            ORDER BY t.id
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("teams_for_user", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn organizations_for_user(&self, user_id: i64) -> Result<Vec<Organization>, AuthError> {
        let rows: Vec<OrganizationRecord> = sqlx::query_as(
            r"
            SELECT o.id, o.title, o.archived, o.created_at, o.updated_at
            FROM organizations o
            JOIN organization_users ou ON ou.organization_id = o.id
            WHERE ou.user_id = $1 AND NOT o.archived
            ORDER BY o.id
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("organizations_for_user", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
