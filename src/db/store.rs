use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Body used when a diagram is created without initial content
pub const BLANK_DIAGRAM_XML: &str = include_str!("../../seed/blank.bpmn");

/// A stored diagram, body included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub name: String,
    pub xml: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing entry, without the body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&DocumentRecord> for DocumentSummary {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for diagram bodies.
///
/// Ids are UUID strings. Anything that does not parse as a UUID behaves like a
/// missing document: `get` yields `None` and `update` yields `false`.
/// Updates replace the whole body; the newest write wins.
pub trait DocumentStore: Send + Sync {
    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<DocumentRecord>, StoreError>>;

    fn create(
        &self,
        name: String,
        initial_xml: Option<String>,
    ) -> BoxFuture<'_, Result<DocumentRecord, StoreError>>;

    fn update<'a>(&'a self, id: &'a str, xml: String) -> BoxFuture<'a, Result<bool, StoreError>>;

    fn list(&self) -> BoxFuture<'_, Result<Vec<DocumentSummary>, StoreError>>;
}

pub(crate) fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}
