use axum::{http::StatusCode, Json};
use crate::models::NotFoundResponse;

/// Fallback for unknown routes
pub async fn not_found() -> (StatusCode, Json<NotFoundResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            detail: "Not Found".to_string(),
        }),
    )
}
