//! Pages of the school management area.
//!
//! Every handler here is reached through the area convention, so the
//! [`AuthUser`] extractor always finds claims that already satisfied the
//! coordinators-only policy.

use axum::{http::StatusCode, response::IntoResponse, Json};
use uuid::Uuid;

use crate::{
    dtos::CreateCourseRequest,
    middleware::AuthUser,
    utils::ValidatedJson,
};

/// Area dashboard.
pub async fn dashboard(AuthUser(claims): AuthUser) -> impl IntoResponse {
    Json(serde_json::json!({
        "area": "school-management",
        "page": "dashboard",
        "signed_in_as": claims.sub,
        "display_name": claims.name,
    }))
}

/// Teacher roster page.
pub async fn teachers(AuthUser(claims): AuthUser) -> impl IntoResponse {
    Json(serde_json::json!({
        "area": "school-management",
        "page": "teachers",
        "signed_in_as": claims.sub,
    }))
}

/// Create a course from the area's course administration page.
pub async fn create_course(
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateCourseRequest>,
) -> impl IntoResponse {
    let course_id = Uuid::new_v4();

    tracing::info!(
        course_id = %course_id,
        code = %req.code,
        created_by = %claims.sub,
        "Course created"
    );

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "course_id": course_id,
            "code": req.code,
            "title": req.title,
            "created_by": claims.sub,
        })),
    )
}
