use chrono::Utc;

use crate::config::AuthGateConfig;
use crate::crypto::PasswordHasher;
use crate::events::{DirectoryEvent, dispatch};
use crate::validators::validate_email;
use crate::{AuthError, NewUser, User, UserRepository};

/// Validates, hashes and stores a new user.
///
/// Authorization is the caller's job; this only enforces input rules.
pub struct CreateUserAction<R> {
    repository: R,
    config: AuthGateConfig,
}

impl<R: UserRepository> CreateUserAction<R> {
    pub fn new(repository: R, config: AuthGateConfig) -> Self {
        Self { repository, config }
    }

    /// # Errors
    ///
    /// `Validation` for a bad email or password, `UserAlreadyExists` when
    /// the email is taken.
    pub async fn execute(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        validate_email(email)?;
        self.config.password.policy().validate(password)?;

        if self.repository.find_user_by_email(email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let hashed_password = self.config.password.hasher().hash(password)?;
        let user = self
            .repository
            .create_user(NewUser {
                email: email.to_owned(),
                hashed_password,
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                is_admin,
            })
            .await?;

        log::info!(target: "authgate", "msg=\"user created\", user_id={}", user.id);
        dispatch(DirectoryEvent::UserCreated {
            user_id: user.id,
            email: user.email.clone(),
            at: Utc::now(),
        })
        .await;

        Ok(user)
    }
}
