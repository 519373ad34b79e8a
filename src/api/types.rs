use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::{AccessToken, Grant, Organization, Team, User};
use crate::{AuthError, SecretString};

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    pub email: String,
    pub password: SecretString,
}

/// Body of `POST /organizations` and `PUT /organizations/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct OrganizationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Body of `POST /organizations/{id}/teams` and `PUT /teams/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct TeamRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Body of `POST /teams/{id}/permissions`.
#[derive(Debug, Default, Deserialize)]
pub struct GrantRequest {
    #[serde(default, rename = "type")]
    pub grant_type: Option<String>,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub admin: bool,
}

/// Partial update; absent fields are left alone. `password` resets it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub admin: Option<bool>,
    pub active: Option<bool>,
    pub password: Option<SecretString>,
}

// Response DTOs

/// Nested reference to a related row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrganizationResponse {
    pub id: i64,
    pub title: String,
    pub archived: bool,
    pub teams: Vec<Summary>,
    pub users: Vec<Summary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrganizationResponse {
    /// `teams` and `users` should already exclude archived teams and
    /// inactive users.
    pub fn new(organization: Organization, teams: &[Team], users: &[User]) -> Self {
        Self {
            id: organization.id,
            title: organization.title,
            archived: organization.archived,
            teams: teams.iter().map(|t| Summary { id: t.id }).collect(),
            users: users.iter().map(|u| Summary { id: u.id }).collect(),
            created_at: organization.created_at,
            updated_at: organization.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamResponse {
    pub id: i64,
    pub title: String,
    pub organization: i64,
    pub archived: bool,
    pub permissions: Vec<Grant>,
    pub users: Vec<Summary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamResponse {
    pub fn new(team: Team, permissions: Vec<Grant>, users: &[User]) -> Self {
        Self {
            id: team.id,
            title: team.title,
            organization: team.organization_id,
            archived: team.archived,
            permissions,
            users: users.iter().map(|u| Summary { id: u.id }).collect(),
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub admin: bool,
    pub active: bool,
    pub teams: Vec<Summary>,
    pub organizations: Vec<Summary>,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(user: User, teams: &[Team], organizations: &[Organization]) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            admin: user.is_admin,
            active: user.is_active,
            teams: teams.iter().map(|t| Summary { id: t.id }).collect(),
            organizations: organizations.iter().map(|o| Summary { id: o.id }).collect(),
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: SecretString,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl From<AccessToken> for TokenResponse {
    fn from(token: AccessToken) -> Self {
        Self {
            token: SecretString::new(token.token),
            user_id: token.user_id,
            expires_at: token.expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// The request field at fault, for validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        let code = match &err {
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::UserAlreadyExists => "USER_ALREADY_EXISTS",
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::PasswordHashError => "PASSWORD_HASH_ERROR",
            AuthError::DatabaseError(_) => "DATABASE_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        };
        let field = match &err {
            AuthError::Validation(validation) => Some(validation.field().to_owned()),
            AuthError::UserAlreadyExists => Some("email".to_owned()),
            _ => None,
        };

        ErrorResponse {
            error: err.to_string(),
            code: code.to_owned(),
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::ValidationError;

    #[test]
    fn test_error_response_carries_field() {
        let response = ErrorResponse::from(AuthError::Validation(
            ValidationError::ImmutableField("organization"),
        ));
        assert_eq!(response.code, "VALIDATION_ERROR");
        assert_eq!(response.field.as_deref(), Some("organization"));
        assert_eq!(response.error, "This field can only be set on creation.");
    }

    #[test]
    fn test_error_response_omits_empty_field() {
        let json = serde_json::to_value(ErrorResponse::from(AuthError::Forbidden)).unwrap();
        assert_eq!(json["code"], "FORBIDDEN");
        assert!(json.get("field").is_none());
    }

    #[test]
    fn test_token_response_debug_is_redacted() {
        let response = TokenResponse {
            token: SecretString::new("abc"),
            user_id: 1,
            expires_at: Utc::now(),
        };
        assert!(!format!("{response:?}").contains("abc"));
    }
}
