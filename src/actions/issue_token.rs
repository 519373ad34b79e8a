use chrono::Utc;

use crate::config::AuthGateConfig;
use crate::crypto::{PasswordHasher, generate_token};
use crate::{AccessToken, AuthError, TokenRepository, User, UserRepository};

/// Exchanges an email and password for a fresh access token.
pub struct IssueTokenAction<U, T> {
    user_repository: U,
    token_repository: T,
    config: AuthGateConfig,
}

impl<U: UserRepository, T: TokenRepository> IssueTokenAction<U, T> {
    pub fn new(user_repository: U, token_repository: T, config: AuthGateConfig) -> Self {
        Self {
            user_repository,
            token_repository,
            config,
        }
    }

    /// # Errors
    ///
    /// `InvalidCredentials` for an unknown email, a wrong password or an
    /// inactive account.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "issue_token", skip_all, err))]
    pub async fn execute(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, AccessToken), AuthError> {
        let Some(user) = self.user_repository.find_user_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active || user.hashed_password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let hasher = self.config.password.hasher();
        if !hasher.verify(password, &user.hashed_password)? {
            log::info!(
                target: "authgate",
                "msg=\"token refused\", user_id={}",
                user.id
            );
            return Err(AuthError::InvalidCredentials);
        }

        let plain = generate_token(self.config.token_length);
        let expires_at = Utc::now() + self.config.tokens.access_token_expiry;
        let token = self
            .token_repository
            .create_token(user.id, &plain, expires_at)
            .await?;

        log::info!(target: "authgate", "msg=\"token issued\", user_id={}", user.id);
        Ok((user, token))
    }
}
