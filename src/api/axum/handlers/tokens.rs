use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::RequestBody;
use crate::actions::IssueTokenAction;
use crate::api::axum::error::AppError;
use crate::api::axum::routes::{ApiState, Directory};
use crate::api::{IssueTokenRequest, TokenResponse};
use crate::config::AuthGateConfig;
use crate::TokenRepository;

/// POST /tokens
///
/// The only endpoint that takes no token.
pub async fn issue_token<D, T>(
    State(state): State<ApiState<D, T>>,
    body: RequestBody,
) -> Result<Response, AppError>
where
    D: Directory,
    T: TokenRepository + Clone + Send + Sync + 'static,
{
    let request: IssueTokenRequest = body.parse()?;

    let action = IssueTokenAction::new(
        state.directory.clone(),
        state.token_repo.clone(),
        AuthGateConfig::clone(&state.config),
    );
    let (_, token) = action
        .execute(&request.email, request.password.expose_secret())
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse::from(token))).into_response())
}
