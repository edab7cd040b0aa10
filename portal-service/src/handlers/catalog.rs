use axum::{extract::State, response::IntoResponse, Json};

use crate::AppState;

/// Public landing page. Lives outside every area, so no policy applies.
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "service": state.config.service_name,
        "version": state.config.service_version,
        "areas": {
            "school-management": "Coordinator-only administration pages"
        },
        "token_endpoint": "/auth/token",
    }))
}
