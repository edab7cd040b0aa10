use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    Json,
};

use crate::{
    authz::AuthzError,
    dtos::ErrorResponse,
    middleware::auth::bearer_token,
    AppState,
};

/// Enforce the area conventions.
///
/// Every request whose path falls under a registered area prefix must carry
/// a valid bearer token whose claims satisfy the required policy. Requests
/// outside every registered prefix pass through untouched.
pub async fn area_policy_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let Some(policy) = state.conventions.required_policy(req.uri().path()) else {
        return Ok(next.run(req).await);
    };

    let token = match bearer_token(req.headers()) {
        Some(token) => token,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Missing or invalid Authorization header".to_string(),
                }),
            ));
        }
    };

    let claims = match state.tokens.validate(token) {
        Ok(claims) => claims,
        Err(_) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or expired token".to_string(),
                }),
            ));
        }
    };

    match state.policies.evaluate(policy, &claims) {
        Ok(()) => {}
        Err(AuthzError::Denied { policy }) => {
            tracing::debug!(
                subject = %claims.sub,
                policy = %policy,
                path = %req.uri().path(),
                "Area access denied"
            );
            return Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: format!("Access to this area requires the '{}' policy", policy),
                }),
            ));
        }
        Err(err) => {
            // A convention referencing an unregistered policy is caught at
            // startup; reaching this arm means the state was assembled wrong.
            tracing::error!(error = %err, "Policy evaluation failed");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            ));
        }
    }

    // Store claims in request extensions so handlers can access them
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
