use utoipa::OpenApi;
use crate::models::*;

/// API root
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "API is running", body = RootResponse)
    )
)]
#[allow(dead_code)]
pub async fn root_doc() {}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// List diagrams
#[utoipa::path(
    get,
    path = "/api/diagrams",
    responses(
        (status = 200, description = "All stored diagrams", body = DiagramsListResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn list_diagrams_doc() {}

/// Get a diagram
#[utoipa::path(
    get,
    path = "/api/diagrams/{diagram_id}",
    params(
        ("diagram_id" = String, Path, description = "Diagram UUID")
    ),
    responses(
        (status = 200, description = "The diagram with its XML", body = DiagramResponse),
        (status = 404, description = "Diagram not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_diagram_doc() {}

/// Create a diagram
#[utoipa::path(
    post,
    path = "/api/diagrams",
    request_body = DiagramCreate,
    responses(
        (status = 201, description = "Diagram created", body = DiagramResponse),
        (status = 422, description = "Invalid diagram name", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn create_diagram_doc() {}

/// Room and host diagnostics
#[utoipa::path(
    get,
    path = "/api/diagnostics",
    responses(
        (status = 200, description = "Current diagnostics", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        root_doc,
        health_check_doc,
        ready_check_doc,
        list_diagrams_doc,
        get_diagram_doc,
        create_diagram_doc,
        diagnostics_doc,
    ),
    components(
        schemas(
            RootResponse,
            HealthResponse,
            DiagramCreate,
            DiagramResponse,
            DiagramListItem,
            DiagramsListResponse,
            DiagnosticsResponse,
            ErrorResponse,
            NotFoundResponse
        )
    ),
    tags(
        (name = "api", description = "BPMN collaboration endpoints")
    )
)]
pub struct ApiDoc;
