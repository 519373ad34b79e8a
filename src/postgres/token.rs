use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::database_error;
use crate::crypto::hash_token;
use crate::{AccessToken, AuthError, TokenRepository};

#[derive(Clone)]
pub struct PostgresTokenRepository {
    pool: PgPool,
}

impl PostgresTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deletes expired rows and returns how many went.
    ///
    /// # Errors
    ///
    /// `DatabaseError` when the delete fails.
    pub async fn prune_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("prune_expired", &e))?;

        Ok(result.rows_affected())
    }
}

#[derive(FromRow)]
struct TokenRecord {
    user_id: i64,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TokenRecord {
    fn into_access_token(self, token: String) -> AccessToken {
        AccessToken {
            token,
            user_id: self.user_id,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token), err))]
    async fn create_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AccessToken, AuthError> {
        let row: TokenRecord = sqlx::query_as(
            r"
            INSERT INTO access_tokens (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING user_id, expires_at, created_at
            ",
        )
        .bind(hash_token(token))
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("create_token", &e))?;

        Ok(row.into_access_token(token.to_owned()))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn find_token(&self, token: &str) -> Result<Option<AccessToken>, AuthError> {
        let token_hash = hash_token(token);

        let row: Option<TokenRecord> = sqlx::query_as(
            "SELECT user_id, expires_at, created_at FROM access_tokens WHERE token_hash = $1",
        )
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_token", &e))?;

        Ok(row.map(|r| r.into_access_token(token_hash)))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM access_tokens WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("revoke_token", &e))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn revoke_all_user_tokens(&self, user_id: i64) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM access_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("revoke_all_user_tokens", &e))?;

        Ok(())
    }
}
