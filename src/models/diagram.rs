use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::{DocumentRecord, DocumentSummary};

/// Longest accepted diagram name
pub const MAX_DIAGRAM_NAME: usize = 200;

/// Request body for creating a diagram
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct DiagramCreate {
    pub name: String,
    /// Initial BPMN XML content. A blank diagram is used when absent.
    pub initial_xml: Option<String>,
}

impl DiagramCreate {
    pub fn validate(&self) -> Result<(), String> {
        let len = self.name.chars().count();
        if len == 0 {
            return Err("Diagram name must not be empty".to_string());
        }
        if len > MAX_DIAGRAM_NAME {
            return Err(format!(
                "Diagram name must be at most {} characters",
                MAX_DIAGRAM_NAME
            ));
        }
        Ok(())
    }
}

/// Full diagram, including its XML body
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct DiagramResponse {
    pub id: String,
    pub name: String,
    pub xml: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentRecord> for DiagramResponse {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name,
            xml: record.xml,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct DiagramListItem {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentSummary> for DiagramListItem {
    fn from(summary: DocumentSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            name: summary.name,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct DiagramsListResponse {
    pub diagrams: Vec<DiagramListItem>,
}
