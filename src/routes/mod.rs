pub mod api;

pub use api::{create_api_routes, create_router};
