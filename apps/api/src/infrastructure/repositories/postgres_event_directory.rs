use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::discipline::DisciplineCatalog;
use crate::domain::event::{EventInfo, EventStatus};
use crate::domain::repositories::{EventDirectory, StoreError};

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    status: EventStatus,
    catalog: Json<DisciplineCatalog>,
}

impl From<EventRow> for EventInfo {
    fn from(row: EventRow) -> Self {
        EventInfo {
            id: row.id,
            name: row.name,
            status: row.status,
            catalog: row.catalog.0,
        }
    }
}

/// Reads events from the shared `events` table
pub struct PostgresEventDirectory {
    pool: PgPool,
}

impl PostgresEventDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventDirectory for PostgresEventDirectory {
    async fn find_event(&self, id: Uuid) -> Result<Option<EventInfo>, StoreError> {
        let row: Option<EventRow> =
            sqlx::query_as("SELECT id, name, status, catalog FROM events WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(EventInfo::from))
    }

    async fn find_events(&self, ids: &[Uuid]) -> Result<Vec<EventInfo>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<EventRow> =
            sqlx::query_as("SELECT id, name, status, catalog FROM events WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(EventInfo::from).collect())
    }
}
