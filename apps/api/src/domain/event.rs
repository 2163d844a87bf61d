use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::discipline::{Discipline, DisciplineCatalog};
use super::errors::RegistrationError;

/// Lifecycle status of a competition, owned by the events subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Planned,
    RegistrationOpen,
    RegistrationClosed,
    InProgress,
    Finished,
}

/// Read-only view of a competition as consumed by the registration core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub id: Uuid,
    pub name: String,
    pub status: EventStatus,
    pub catalog: DisciplineCatalog,
}

impl EventInfo {
    /// Whether new registrations and roster changes are accepted
    pub fn accepts_changes(&self) -> bool {
        self.status == EventStatus::RegistrationOpen
    }

    pub fn ensure_open(&self) -> Result<(), RegistrationError> {
        if self.accepts_changes() {
            Ok(())
        } else {
            Err(RegistrationError::RegistrationClosed(self.id))
        }
    }

    pub fn validate_discipline(&self, discipline: &Discipline) -> Result<(), RegistrationError> {
        self.catalog.validate(discipline)
    }
}
