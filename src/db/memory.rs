use chrono::Utc;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{
    parse_id, DocumentRecord, DocumentStore, DocumentSummary, StoreError, BLANK_DIAGRAM_XML,
};

/// Process-local store, used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<Uuid, DocumentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<DocumentRecord>, StoreError>> {
        Box::pin(async move {
            let Some(uuid) = parse_id(id) else {
                return Ok(None);
            };
            Ok(self.docs.read().await.get(&uuid).cloned())
        })
    }

    fn create(
        &self,
        name: String,
        initial_xml: Option<String>,
    ) -> BoxFuture<'_, Result<DocumentRecord, StoreError>> {
        Box::pin(async move {
            let now = Utc::now();
            let record = DocumentRecord {
                id: Uuid::new_v4(),
                name,
                xml: initial_xml.unwrap_or_else(|| BLANK_DIAGRAM_XML.to_string()),
                version: 1,
                created_at: now,
                updated_at: now,
            };
            self.docs.write().await.insert(record.id, record.clone());
            Ok(record)
        })
    }

    fn update<'a>(&'a self, id: &'a str, xml: String) -> BoxFuture<'a, Result<bool, StoreError>> {
        Box::pin(async move {
            let Some(uuid) = parse_id(id) else {
                return Ok(false);
            };
            let mut docs = self.docs.write().await;
            match docs.get_mut(&uuid) {
                Some(record) => {
                    record.xml = xml;
                    record.version += 1;
                    record.updated_at = Utc::now();
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<DocumentSummary>, StoreError>> {
        Box::pin(async move {
            let docs = self.docs.read().await;
            let mut summaries: Vec<DocumentSummary> =
                docs.values().map(DocumentSummary::from).collect();
            summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
            Ok(summaries)
        })
    }
}
