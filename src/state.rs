use std::sync::Arc;

use crate::collab::{Hub, RoomCoordinator};
use crate::config::Config;
use crate::db::DocumentStore;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub coordinator: Arc<RoomCoordinator>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        let coordinator = Arc::new(RoomCoordinator::new(Arc::new(Hub::new()), store.clone()));
        Self {
            config: Arc::new(config),
            store,
            coordinator,
        }
    }
}
