use super::events::TeamEvent;
use super::value_objects::TeamStatus;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::discipline::{BoatClass, Discipline};
use crate::domain::errors::RegistrationError;

/// Team aggregate root
///
/// Represents a named crew entered in one event for one boat class.
/// Roles live on the member registrations; the team keeps the roster order
/// and the derived completeness/status.
///
/// # Invariants
/// - Name cannot be blank
/// - `members` has no duplicates
/// - `is_complete` and `aggregate_status` are only written by roster recomputation
///
/// # Example
/// ```
/// use paddle_registry_api::domain::discipline::{BoatClass, Discipline, Distance, SexCategory};
/// use paddle_registry_api::domain::team::Team;
/// use uuid::Uuid;
///
/// let discipline = Discipline::new(BoatClass::D10, SexCategory::Mixed, [Distance::meters(200)])
///     .expect("valid discipline");
/// let (team, events) = Team::new(Uuid::new_v4(), "Dragons".to_string(), None, discipline)
///     .expect("valid team");
///
/// assert_eq!(team.name(), "Dragons");
/// assert!(!events.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    id: Uuid,
    event_id: Uuid,
    name: String,
    city: Option<String>,
    discipline: Discipline,
    members: Vec<Uuid>,
    is_complete: bool,
    aggregate_status: TeamStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    stored_version: Option<DateTime<Utc>>,
}

impl Team {
    /// Creates a new, empty Team aggregate
    ///
    /// # Arguments
    /// * `event_id` - The competition this team is entered in
    /// * `name` - Team name (cannot be blank)
    /// * `city` - Optional home city
    /// * `discipline` - Boat class, sex and distances the crew races
    ///
    /// # Business Rules Enforced
    /// - Name must not be blank
    /// - A new team is incomplete and waiting for members
    pub fn new(
        event_id: Uuid,
        name: String,
        city: Option<String>,
        discipline: Discipline,
    ) -> Result<(Self, Vec<TeamEvent>), RegistrationError> {
        let name = validate_name(&name)?;
        let now = Utc::now();

        let team = Self {
            id: Uuid::new_v4(),
            event_id,
            name,
            city: normalize_city(city),
            discipline,
            members: Vec::new(),
            is_complete: false,
            aggregate_status: TeamStatus::WaitingForTeam,
            created_at: now,
            updated_at: now,
            stored_version: None,
        };

        let events = vec![TeamEvent::Created {
            team_id: team.id,
            event_id: team.event_id,
            name: team.name.clone(),
        }];

        Ok((team, events))
    }

    /// Renames the team
    pub fn rename(&mut self, name: &str) -> Result<Option<TeamEvent>, RegistrationError> {
        let name = validate_name(name)?;
        if name == self.name {
            return Ok(None);
        }

        self.name = name;
        self.touch();
        Ok(Some(TeamEvent::Renamed {
            team_id: self.id,
            name: self.name.clone(),
        }))
    }

    pub fn set_city(&mut self, city: Option<String>) {
        self.city = normalize_city(city);
        self.touch();
    }

    /// Case-insensitive key used to keep team names unique within an event
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }

    pub(crate) fn push_member(&mut self, registration_id: Uuid) {
        if !self.members.contains(&registration_id) {
            self.members.push(registration_id);
            self.touch();
        }
    }

    pub(crate) fn remove_member(&mut self, registration_id: Uuid) -> bool {
        let before = self.members.len();
        self.members.retain(|id| *id != registration_id);
        let removed = self.members.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Stores freshly derived state, reporting whether it changed
    pub(crate) fn apply_derived(
        &mut self,
        is_complete: bool,
        status: TeamStatus,
    ) -> Option<TeamEvent> {
        if self.is_complete == is_complete && self.aggregate_status == status {
            return None;
        }

        self.is_complete = is_complete;
        self.aggregate_status = status;
        self.touch();
        Some(TeamEvent::StateRecomputed {
            team_id: self.id,
            is_complete,
            status,
        })
    }

    // Stored timestamps keep microseconds; every change must move past them
    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at + Duration::microseconds(1));
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn discipline(&self) -> &Discipline {
        &self.discipline
    }

    pub fn boat_class(&self) -> &BoatClass {
        self.discipline.boat_class()
    }

    /// Registration ids in roster order
    pub fn members(&self) -> &[Uuid] {
        &self.members
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn aggregate_status(&self) -> TeamStatus {
        self.aggregate_status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// `updated_at` of the committed row this team was read from
    ///
    /// `None` until the team has been stored.
    pub fn stored_version(&self) -> Option<DateTime<Utc>> {
        self.stored_version
    }

    /// Whether anything changed since the team was read
    pub fn has_changes(&self) -> bool {
        self.stored_version != Some(self.updated_at)
    }

    /// Records the current state as committed; only for repository implementations
    pub fn mark_stored(&mut self) {
        self.stored_version = Some(self.updated_at);
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// Bypasses validation; only for repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        event_id: Uuid,
        name: String,
        city: Option<String>,
        discipline: Discipline,
        members: Vec<Uuid>,
        is_complete: bool,
        aggregate_status: TeamStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            event_id,
            name,
            city,
            discipline,
            members,
            is_complete,
            aggregate_status,
            created_at,
            updated_at,
            stored_version: Some(updated_at),
        }
    }
}

/// Normalized form of a team name for uniqueness checks
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn validate_name(name: &str) -> Result<String, RegistrationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RegistrationError::validation("Team name cannot be empty"));
    }
    Ok(name.to_string())
}

fn normalize_city(city: Option<String>) -> Option<String> {
    city.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}
