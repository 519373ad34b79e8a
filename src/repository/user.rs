use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AuthError;
use crate::permissions::Principal;

use super::filter::ActiveFilter;
use super::organization::Organization;
use super::team::Team;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            is_admin: self.is_admin,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub hashed_password: Option<String>,
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait UserRepository {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AuthError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn list_users(&self, filter: ActiveFilter) -> Result<Vec<User>, AuthError>;
    /// Fails with `UserAlreadyExists` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AuthError>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, AuthError>;
    async fn deactivate_user(&self, id: i64) -> Result<(), AuthError>;
    /// Non-archived teams the user belongs to.
    async fn teams_for_user(&self, user_id: i64) -> Result<Vec<Team>, AuthError>;
    /// Non-archived organizations the user belongs to.
    async fn organizations_for_user(&self, user_id: i64) -> Result<Vec<Organization>, AuthError>;
}
