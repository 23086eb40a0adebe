use crate::{
    db::StoreError,
    models::{DiagramCreate, DiagramResponse, DiagramsListResponse, ErrorResponse},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info, warn};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            code: status.as_u16(),
            status: status.to_string(),
            error: error.into(),
        }),
    )
}

fn store_failure(e: StoreError) -> ApiError {
    error!("Diagram store failure: {}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to access diagram store")
}

/// List all diagrams
pub async fn list_diagrams(
    State(state): State<AppState>,
) -> Result<Json<DiagramsListResponse>, ApiError> {
    let summaries = state.store.list().await.map_err(store_failure)?;
    Ok(Json(DiagramsListResponse {
        diagrams: summaries.into_iter().map(Into::into).collect(),
    }))
}

/// Fetch one diagram including its XML
pub async fn get_diagram(
    State(state): State<AppState>,
    Path(diagram_id): Path<String>,
) -> Result<Json<DiagramResponse>, ApiError> {
    match state.store.get(&diagram_id).await.map_err(store_failure)? {
        Some(record) => Ok(Json(record.into())),
        None => Err(api_error(StatusCode::NOT_FOUND, "Diagram not found")),
    }
}

/// Create a diagram
pub async fn create_diagram(
    State(state): State<AppState>,
    Json(body): Json<DiagramCreate>,
) -> Result<(StatusCode, Json<DiagramResponse>), ApiError> {
    if let Err(message) = body.validate() {
        warn!("Rejected diagram creation: {}", message);
        return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, message));
    }

    let record = state
        .store
        .create(body.name, body.initial_xml)
        .await
        .map_err(store_failure)?;
    info!("Created diagram {} ({})", record.name, record.id);
    Ok((StatusCode::CREATED, Json(record.into())))
}
