use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{IntrospectRequest, IntrospectResponse, TokenRequest},
    services::Password,
    utils::ValidatedJson,
    AppState,
};

/// Exchange portal credentials for a bearer token.
pub async fn issue_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let password = Password::new(req.password);
    let account = state
        .directory
        .verify_credentials(&req.username, &password)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid username or password")))?;

    tracing::info!(username = %account.username, "Issuing access token");

    let response = state
        .tokens
        .issue(&account.username, &account.display_name, account.roles)?;

    Ok((StatusCode::OK, Json(response)))
}

/// Report whether a presented token is active and echo its claims.
pub async fn introspect(
    State(state): State<AppState>,
    Json(req): Json<IntrospectRequest>,
) -> impl IntoResponse {
    let response = match state.tokens.validate(&req.token) {
        Ok(claims) => IntrospectResponse {
            active: true,
            sub: Some(claims.sub),
            roles: Some(claims.roles),
            exp: Some(claims.exp),
            iat: Some(claims.iat),
        },
        Err(_) => IntrospectResponse {
            active: false,
            sub: None,
            roles: None,
            exp: None,
            iat: None,
        },
    };

    Json(response)
}
