use crate::{
    docs::ApiDoc,
    handlers::{
        create_diagram, diagnostics, get_diagram, health_check, list_diagrams, not_found,
        ready_check, root,
    },
    state::AppState,
    ws::handler::websocket_handler,
};
use axum::{http::HeaderValue, routing::get, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create API routes
pub fn create_api_routes() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/diagrams", get(list_diagrams).post(create_diagram))
        .route("/diagrams/:diagram_id", get(get_diagram))
        .route("/diagnostics", get(diagnostics))
}

/// Assemble the full application: REST API, collaboration socket, docs, and
/// the shared layers.
pub fn create_router(state: AppState) -> Router {
    let origins = state.config.cors_origin_list();
    if origins.is_none() && state.config.is_production() {
        warn!("CORS allows any origin in production");
    }
    let cors = cors_layer(origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/ws/:diagram_id", get(websocket_handler))
        .nest("/api", create_api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: Option<Vec<String>>) -> CorsLayer {
    let allow_origin = match origins {
        Some(origins) => {
            let parsed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();
            AllowOrigin::list(parsed)
        }
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
