use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Error as SqlxError, Row};
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use super::store::{
    parse_id, DocumentRecord, DocumentStore, DocumentSummary, StoreError, BLANK_DIAGRAM_XML,
};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS diagrams (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        bpmn_xml TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

/// Postgres-backed diagram store
pub struct DbDiagram {
    pool: PgPool,
}

impl DbDiagram {
    /// Create the connection pool and make sure the `diagrams` table exists
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    pub async fn connect(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        sqlx::query(CREATE_TABLE_SQL).execute(&pool).await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<DocumentRecord>, SqlxError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, bpmn_xml, version, created_at, updated_at
            FROM diagrams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| record_from_row(&row)).transpose()
    }

    async fn insert(&self, name: String, xml: String) -> Result<DocumentRecord, SqlxError> {
        let row = sqlx::query(
            r#"
            INSERT INTO diagrams (id, name, bpmn_xml)
            VALUES ($1, $2, $3)
            RETURNING id, name, bpmn_xml, version, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(xml)
        .fetch_one(&self.pool)
        .await?;

        let record = record_from_row(&row)?;
        info!("Diagram '{}' created with id {}", record.name, record.id);
        Ok(record)
    }

    async fn replace_body(&self, id: Uuid, xml: String) -> Result<bool, SqlxError> {
        let result = sqlx::query(
            r#"
            UPDATE diagrams
            SET bpmn_xml = $2, version = version + 1, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(xml)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn summaries(&self) -> Result<Vec<DocumentSummary>, SqlxError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at
            FROM diagrams
            ORDER BY created_at, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<DocumentSummary, SqlxError> {
                Ok(DocumentSummary {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                    updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
                })
            })
            .collect()
    }
}

fn record_from_row(row: &PgRow) -> Result<DocumentRecord, SqlxError> {
    Ok(DocumentRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        xml: row.try_get("bpmn_xml")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl DocumentStore for DbDiagram {
    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<DocumentRecord>, StoreError>> {
        Box::pin(async move {
            let Some(uuid) = parse_id(id) else {
                return Ok(None);
            };
            self.fetch(uuid).await.map_err(|e| {
                error!("Failed to load diagram '{}': {}", id, e);
                StoreError::from(e)
            })
        })
    }

    fn create(
        &self,
        name: String,
        initial_xml: Option<String>,
    ) -> BoxFuture<'_, Result<DocumentRecord, StoreError>> {
        Box::pin(async move {
            let xml = initial_xml.unwrap_or_else(|| BLANK_DIAGRAM_XML.to_string());
            self.insert(name, xml).await.map_err(|e| {
                error!("Failed to create diagram: {}", e);
                StoreError::from(e)
            })
        })
    }

    fn update<'a>(&'a self, id: &'a str, xml: String) -> BoxFuture<'a, Result<bool, StoreError>> {
        Box::pin(async move {
            let Some(uuid) = parse_id(id) else {
                return Ok(false);
            };
            self.replace_body(uuid, xml).await.map_err(|e| {
                error!("Failed to update diagram '{}': {}", id, e);
                StoreError::from(e)
            })
        })
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<DocumentSummary>, StoreError>> {
        Box::pin(async move {
            self.summaries().await.map_err(|e| {
                error!("Failed to list diagrams: {}", e);
                StoreError::from(e)
            })
        })
    }
}
