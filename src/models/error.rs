use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for an error
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
}

/// Body returned for routes that do not exist
#[derive(Serialize, Deserialize, ToSchema)]
pub struct NotFoundResponse {
    pub detail: String,
}
