use std::collections::BTreeMap;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method};
use serde_json::Value;

use super::error::AppError;
use super::routes::{ApiState, Directory};
use crate::permissions::AuthContext;
use crate::{TokenRepository, User, UserRepository};

/// The user behind the request's token, if any.
///
/// Never rejects for a missing, unknown or expired token: the caller is then
/// anonymous and the authorizer answers 401. Only storage failures reject.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<User>);

impl Caller {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    /// The immutable context the rule engine evaluates against.
    pub fn context(
        &self,
        method: Method,
        query: BTreeMap<String, String>,
        body: Option<Value>,
    ) -> AuthContext {
        let ctx = AuthContext::new(self.0.as_ref().map(User::principal), method).with_query(query);
        match body {
            Some(body) => ctx.with_body(body),
            None => ctx,
        }
    }
}

/// Accepts `Bearer <token>` and `Token <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
}

impl<D, T> FromRequestParts<ApiState<D, T>> for Caller
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState<D, T>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_bearer_token(&parts.headers) else {
            return Ok(Caller(None));
        };

        let Some(access_token) = state.token_repo.find_token(&token).await? else {
            log::debug!(target: "authgate", "msg=\"unknown token\"");
            return Ok(Caller(None));
        };

        if access_token.is_expired() {
            log::debug!(
                target: "authgate",
                "msg=\"expired token\", user_id={}",
                access_token.user_id
            );
            return Ok(Caller(None));
        }

        let user = state
            .directory
            .find_user_by_id(access_token.user_id)
            .await?;
        Ok(Caller(user))
    }
}
