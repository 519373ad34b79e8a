use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// An access token. Repositories store only the SHA-256 of `token`; the
/// plaintext is returned once, from `create_token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[async_trait]
pub trait TokenRepository {
    async fn create_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AccessToken, AuthError>;
    /// Looks a plaintext token up by its hash.
    async fn find_token(&self, token: &str) -> Result<Option<AccessToken>, AuthError>;
    async fn revoke_token(&self, token: &str) -> Result<(), AuthError>;
    async fn revoke_all_user_tokens(&self, user_id: i64) -> Result<(), AuthError>;
}
