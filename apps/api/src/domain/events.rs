use super::registration::events::RegistrationEvent;
use super::team::events::TeamEvent;

/// Any event raised while mutating a roster
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    Team(TeamEvent),
    Registration(RegistrationEvent),
}

impl From<TeamEvent> for DomainEvent {
    fn from(event: TeamEvent) -> Self {
        DomainEvent::Team(event)
    }
}

impl From<RegistrationEvent> for DomainEvent {
    fn from(event: RegistrationEvent) -> Self {
        DomainEvent::Registration(event)
    }
}

/// Logs committed events; the registry has no other subscribers
pub fn log_committed(events: &[DomainEvent]) {
    for event in events {
        match event {
            DomainEvent::Team(event) => {
                tracing::info!(team_id = %event.team_id(), ?event, "team event")
            }
            DomainEvent::Registration(event) => {
                tracing::info!(
                    registration_id = %event.registration_id(),
                    ?event,
                    "registration event"
                )
            }
        }
    }
}
