use uuid::Uuid;

use super::value_objects::{RegistrationStatus, Role};
use crate::domain::actor::ActorRole;

/// Domain events raised by the registration aggregate
///
/// Services log these once the surrounding change set has been committed.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationEvent {
    /// Fired when a sportsperson is registered for an event
    Created {
        registration_id: Uuid,
        sportsperson_id: Uuid,
        event_id: Uuid,
        team_id: Option<Uuid>,
    },
    /// Fired on any status change, operator-driven or team-driven
    StatusChanged {
        registration_id: Uuid,
        from: RegistrationStatus,
        to: RegistrationStatus,
    },
    /// Fired when the payment flag flips
    PaymentChanged {
        registration_id: Uuid,
        paid: bool,
        actor: ActorRole,
    },
    /// Fired when the role inside a team changes
    RoleChanged {
        registration_id: Uuid,
        from: Role,
        to: Role,
    },
    DisciplineChanged {
        registration_id: Uuid,
    },
    Deleted {
        registration_id: Uuid,
    },
}

impl RegistrationEvent {
    pub fn registration_id(&self) -> Uuid {
        match self {
            RegistrationEvent::Created { registration_id, .. }
            | RegistrationEvent::StatusChanged { registration_id, .. }
            | RegistrationEvent::PaymentChanged { registration_id, .. }
            | RegistrationEvent::RoleChanged { registration_id, .. }
            | RegistrationEvent::DisciplineChanged { registration_id }
            | RegistrationEvent::Deleted { registration_id } => *registration_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_event_exposes_registration_id() {
        let id = Uuid::new_v4();
        let events = [
            RegistrationEvent::Created {
                registration_id: id,
                sportsperson_id: Uuid::new_v4(),
                event_id: Uuid::new_v4(),
                team_id: None,
            },
            RegistrationEvent::StatusChanged {
                registration_id: id,
                from: RegistrationStatus::Queued,
                to: RegistrationStatus::Confirmed,
            },
            RegistrationEvent::PaymentChanged {
                registration_id: id,
                paid: true,
                actor: ActorRole::Organizer,
            },
            RegistrationEvent::RoleChanged {
                registration_id: id,
                from: Role::Paddler,
                to: Role::Captain,
            },
            RegistrationEvent::DisciplineChanged { registration_id: id },
            RegistrationEvent::Deleted { registration_id: id },
        ];

        assert!(events.iter().all(|e| e.registration_id() == id));
    }
}
