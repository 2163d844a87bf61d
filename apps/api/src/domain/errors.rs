use thiserror::Error;
use uuid::Uuid;

use super::actor::ActorRole;
use super::policy::Violation;
use super::registration::value_objects::RegistrationStatus;

/// Errors surfaced by every core registration operation
///
/// The presentation layer renders these; it never re-checks invariants itself.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Roster violates capacity policy: {}", join_violations(.0))]
    CapacityViolation(Vec<Violation>),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: RegistrationStatus,
        to: RegistrationStatus,
    },

    #[error("Team {0} is incomplete")]
    TeamIncomplete(Uuid),

    #[error("Actor role {actor} may not revoke payment of registration {registration_id}")]
    PaymentDowngradeDenied {
        registration_id: Uuid,
        actor: ActorRole,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Concurrent change invalidated the roster: {}", join_violations(.0))]
    ConflictOnCommit(Vec<Violation>),

    #[error("Event {0} does not accept registration changes")]
    RegistrationClosed(Uuid),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RegistrationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return "roster changed concurrently".to_string();
    }
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
