use uuid::Uuid;

use super::value_objects::TeamStatus;
use crate::domain::registration::Role;

/// Domain events that occur within the Team aggregate
///
/// These events represent roster moments worth an audit trail. Services
/// log them after the change set carrying them has been committed.
///
/// # Example
/// ```
/// use paddle_registry_api::domain::team::events::TeamEvent;
/// use uuid::Uuid;
///
/// let event = TeamEvent::Created {
///     team_id: Uuid::new_v4(),
///     event_id: Uuid::new_v4(),
///     name: "Dragons".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum TeamEvent {
    /// Fired when a team is created
    Created {
        team_id: Uuid,
        /// Competition the team is entered in
        event_id: Uuid,
        name: String,
    },
    MemberAdded {
        team_id: Uuid,
        registration_id: Uuid,
        role: Role,
    },
    MemberRemoved {
        team_id: Uuid,
        registration_id: Uuid,
    },
    Renamed {
        team_id: Uuid,
        name: String,
    },
    /// Fired when the derived completeness or aggregate status changes
    StateRecomputed {
        team_id: Uuid,
        is_complete: bool,
        status: TeamStatus,
    },
    /// Fired on the surviving team of a merge
    Merged {
        team_id: Uuid,
        absorbed: Vec<Uuid>,
    },
    Deleted {
        team_id: Uuid,
    },
}

impl TeamEvent {
    /// Returns the team_id for this event
    pub fn team_id(&self) -> Uuid {
        match self {
            TeamEvent::Created { team_id, .. }
            | TeamEvent::MemberAdded { team_id, .. }
            | TeamEvent::MemberRemoved { team_id, .. }
            | TeamEvent::Renamed { team_id, .. }
            | TeamEvent::StateRecomputed { team_id, .. }
            | TeamEvent::Merged { team_id, .. }
            | TeamEvent::Deleted { team_id } => *team_id,
        }
    }
}
