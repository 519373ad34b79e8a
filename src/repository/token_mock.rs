#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::AuthError;
use crate::crypto::hash_token;

use super::token::{AccessToken, TokenRepository};

#[derive(Clone, Default)]
pub struct MockTokenRepository {
    /// Stored rows; `token` holds the hash.
    pub tokens: Arc<Mutex<Vec<AccessToken>>>,
}

impl MockTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for MockTokenRepository {
    async fn create_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AccessToken, AuthError> {
        let now = Utc::now();

        self.tokens.lock().unwrap().push(AccessToken {
            token: hash_token(token),
            user_id,
            expires_at,
            created_at: now,
        });

        Ok(AccessToken {
            token: token.to_owned(),
            user_id,
            expires_at,
            created_at: now,
        })
    }

    async fn find_token(&self, token: &str) -> Result<Option<AccessToken>, AuthError> {
        let hashed = hash_token(token);
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens.iter().find(|t| t.token == hashed).cloned())
    }

    async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let hashed = hash_token(token);
        self.tokens.lock().unwrap().retain(|t| t.token != hashed);
        Ok(())
    }

    async fn revoke_all_user_tokens(&self, user_id: i64) -> Result<(), AuthError> {
        self.tokens.lock().unwrap().retain(|t| t.user_id != user_id);
        Ok(())
    }
}
