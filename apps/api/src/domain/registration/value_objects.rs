use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a registration holds inside a team roster
///
/// `None` marks an individual (non-team) registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "team_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Captain,
    Paddler,
    Coxswain,
    Drummer,
    Reserve,
    None,
}

impl Role {
    /// Roles a team member may hold, in roster display order
    pub const TEAM_ROLES: [Role; 5] = [
        Role::Captain,
        Role::Coxswain,
        Role::Drummer,
        Role::Paddler,
        Role::Reserve,
    ];

    pub fn is_team_role(&self) -> bool {
        *self != Role::None
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Captain => write!(f, "captain"),
            Role::Paddler => write!(f, "paddler"),
            Role::Coxswain => write!(f, "coxswain"),
            Role::Drummer => write!(f, "drummer"),
            Role::Reserve => write!(f, "reserve"),
            Role::None => write!(f, "none"),
        }
    }
}

/// Registration workflow status
///
/// # Status Transitions
/// ```text
/// Queued -> Confirmed -> CheckedIn
///    |          |
///    +----------+--> Disqualified | NoShow
/// WaitingForTeam --> Disqualified | NoShow
/// ```
///
/// `WaitingForTeam` is entered and left only by team completeness, never
/// by an operator transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Queued,
    Confirmed,
    CheckedIn,
    WaitingForTeam,
    Disqualified,
    NoShow,
}

impl RegistrationStatus {
    /// Checks if an operator may move a registration from this status to `next`
    ///
    /// # Example
    /// ```
    /// use paddle_registry_api::domain::registration::value_objects::RegistrationStatus;
    ///
    /// assert!(RegistrationStatus::Queued.can_transition_to(RegistrationStatus::Confirmed));
    /// assert!(!RegistrationStatus::Queued.can_transition_to(RegistrationStatus::CheckedIn));
    /// ```
    pub fn can_transition_to(&self, next: RegistrationStatus) -> bool {
        use RegistrationStatus::*;
        match (self, next) {
            (Queued, Confirmed) | (Confirmed, CheckedIn) => true,
            (current, Disqualified | NoShow) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::CheckedIn
                | RegistrationStatus::Disqualified
                | RegistrationStatus::NoShow
        )
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationStatus::Queued => write!(f, "queued"),
            RegistrationStatus::Confirmed => write!(f, "confirmed"),
            RegistrationStatus::CheckedIn => write!(f, "checked_in"),
            RegistrationStatus::WaitingForTeam => write!(f, "waiting_for_team"),
            RegistrationStatus::Disqualified => write!(f, "disqualified"),
            RegistrationStatus::NoShow => write!(f, "no_show"),
        }
    }
}
