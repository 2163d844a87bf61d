use serde::{Deserialize, Serialize};

use crate::domain::registration::RegistrationStatus;

/// Aggregate status of a team, derived from completeness and member statuses
///
/// # Derivation
/// ```text
/// incomplete, or any member queued/waiting  -> WaitingForTeam
/// every member confirmed                    -> Confirmed
/// every member checked in                   -> CheckedIn
/// anything else                             -> Partial
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    /// A required role is unfilled or a member still awaits confirmation
    WaitingForTeam,
    /// Every member is confirmed
    Confirmed,
    /// Every member has checked in
    CheckedIn,
    /// Members are in a mix of confirmed and terminal states
    Partial,
}

impl TeamStatus {
    /// Derives the aggregate status of a roster
    ///
    /// # Example
    /// ```
    /// use paddle_registry_api::domain::registration::RegistrationStatus;
    /// use paddle_registry_api::domain::team::TeamStatus;
    ///
    /// let statuses = [RegistrationStatus::Confirmed, RegistrationStatus::Confirmed];
    /// assert_eq!(TeamStatus::derive(true, statuses), TeamStatus::Confirmed);
    /// assert_eq!(TeamStatus::derive(false, statuses), TeamStatus::WaitingForTeam);
    /// ```
    pub fn derive(
        is_complete: bool,
        member_statuses: impl IntoIterator<Item = RegistrationStatus>,
    ) -> TeamStatus {
        let statuses: Vec<RegistrationStatus> = member_statuses.into_iter().collect();

        let waiting = statuses.iter().any(|s| {
            matches!(
                s,
                RegistrationStatus::Queued | RegistrationStatus::WaitingForTeam
            )
        });
        if !is_complete || waiting || statuses.is_empty() {
            return TeamStatus::WaitingForTeam;
        }

        if statuses.iter().all(|s| *s == RegistrationStatus::Confirmed) {
            TeamStatus::Confirmed
        } else if statuses.iter().all(|s| *s == RegistrationStatus::CheckedIn) {
            TeamStatus::CheckedIn
        } else {
            TeamStatus::Partial
        }
    }
}

impl std::fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamStatus::WaitingForTeam => write!(f, "waiting_for_team"),
            TeamStatus::Confirmed => write!(f, "confirmed"),
            TeamStatus::CheckedIn => write!(f, "checked_in"),
            TeamStatus::Partial => write!(f, "partial"),
        }
    }
}
