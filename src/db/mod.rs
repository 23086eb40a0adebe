pub mod dbdiagram;
pub mod memory;
pub mod seed;
pub mod store;

pub use dbdiagram::DbDiagram;
pub use memory::MemoryStore;
pub use store::{DocumentRecord, DocumentStore, DocumentSummary, StoreError};

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;

/// Pick the document store for this process and seed it if configured.
///
/// A database URL selects Postgres. Without one, or when the database cannot
/// be reached, diagrams live in memory for the lifetime of the process.
pub async fn open_store(config: &Config) -> Arc<dyn DocumentStore> {
    let store: Arc<dyn DocumentStore> = match &config.db_url {
        Some(db_url) => match DbDiagram::connect(db_url).await {
            Ok(db) => {
                info!("Database initialized successfully");
                Arc::new(db)
            }
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                warn!("Falling back to the in-memory diagram store");
                Arc::new(MemoryStore::new())
            }
        },
        None => {
            warn!("No database URL configured - diagrams are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    if config.seed_examples {
        if let Err(e) = seed::seed_examples(store.as_ref()).await {
            error!("Failed to seed example diagrams: {}", e);
        }
    }

    store
}
