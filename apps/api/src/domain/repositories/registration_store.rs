use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::errors::RegistrationError;
use crate::domain::policy::{RoleCounts, RosterCapacityPolicy, Violation};
use crate::domain::registration::RegistrationRecord;
use crate::domain::sportsperson::Sportsperson;
use crate::domain::team::{Roster, Team};

/// Failures reported by a persistence adapter
#[derive(Debug, Error)]
pub enum StoreError {
    /// A roster guard failed after the writes were applied
    #[error("Roster guard failed: {violations:?}")]
    Conflict { violations: Vec<Violation> },

    /// The stored row moved on since it was read, or was deleted
    #[error("Stale write to {entity} {id}")]
    StaleWrite { entity: &'static str, id: Uuid },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for RegistrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { violations } => RegistrationError::ConflictOnCommit(violations),
            StoreError::StaleWrite { .. } => RegistrationError::ConflictOnCommit(Vec::new()),
            StoreError::Database(message) => RegistrationError::Storage(message),
        }
    }
}

/// Writes that must land together or not at all
///
/// Adapters apply the writes in field order (new sportspeople, teams,
/// registrations, then deletions) and check every guarded team before
/// committing. Teams and registrations are written against the version
/// they were read at: a record without a stored version must not exist
/// yet, any other record must still carry its stored `updated_at`.
/// Anything else fails with [`StoreError::StaleWrite`].
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub sportspeople: Vec<Sportsperson>,
    pub teams: Vec<Team>,
    pub registrations: Vec<RegistrationRecord>,
    pub deleted_registrations: Vec<Uuid>,
    pub deleted_teams: Vec<Uuid>,
    pub guarded_teams: Vec<Uuid>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_sportsperson(&mut self, sportsperson: Sportsperson) -> &mut Self {
        self.sportspeople.push(sportsperson);
        self
    }

    pub fn save_registration(&mut self, registration: RegistrationRecord) -> &mut Self {
        self.registrations.retain(|r| r.id() != registration.id());
        self.registrations.push(registration);
        self
    }

    pub fn delete_registration(&mut self, registration_id: Uuid) -> &mut Self {
        self.registrations.retain(|r| r.id() != registration_id);
        if !self.deleted_registrations.contains(&registration_id) {
            self.deleted_registrations.push(registration_id);
        }
        self
    }

    /// Stores a roster and guards its team
    ///
    /// The team is always written so a concurrent change to it is caught;
    /// members are written only when they changed since they were read.
    pub fn save_roster(&mut self, roster: &Roster) -> &mut Self {
        let team = roster.team().clone();
        let team_id = team.id();
        self.teams.retain(|t| t.id() != team_id);
        self.teams.push(team);
        for member in roster.members().iter().filter(|m| m.has_changes()) {
            self.save_registration(member.clone());
        }
        self.guard_team(team_id)
    }

    /// Re-validates the team's roster before the commit lands
    pub fn guard_team(&mut self, team_id: Uuid) -> &mut Self {
        if !self.guarded_teams.contains(&team_id) {
            self.guarded_teams.push(team_id);
        }
        self
    }

    pub fn delete_team(&mut self, team_id: Uuid) -> &mut Self {
        self.teams.retain(|t| t.id() != team_id);
        self.guarded_teams.retain(|id| *id != team_id);
        if !self.deleted_teams.contains(&team_id) {
            self.deleted_teams.push(team_id);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sportspeople.is_empty()
            && self.teams.is_empty()
            && self.registrations.is_empty()
            && self.deleted_registrations.is_empty()
            && self.deleted_teams.is_empty()
    }
}

/// Re-validates a stored team against the registrations pointing at it
///
/// Shared by every adapter; runs on the state the commit would produce.
pub fn check_roster_guard(team: &Team, registrations: &[RegistrationRecord]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let listed: HashSet<Uuid> = team.members().iter().copied().collect();
    let pointing: HashSet<Uuid> = registrations.iter().map(RegistrationRecord::id).collect();
    if listed != pointing || listed.len() != team.members().len() {
        violations.push(Violation::RosterOutOfSync { team_id: team.id() });
    }

    let mut seen: HashMap<Uuid, usize> = HashMap::new();
    for registration in registrations {
        *seen.entry(registration.sportsperson_id()).or_insert(0) += 1;
    }
    let mut duplicates: Vec<Uuid> = seen
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, _)| id)
        .collect();
    duplicates.sort();
    violations.extend(
        duplicates
            .into_iter()
            .map(|sportsperson_id| Violation::DuplicateSportsperson { sportsperson_id }),
    );

    let counts: RoleCounts = registrations.iter().map(RegistrationRecord::role).collect();
    violations.extend(RosterCapacityPolicy::validate_roster(team.boat_class(), &counts).blocking());

    violations
}

/// Persistence port for registrations, teams and sportspeople
///
/// Reads return the last committed state; all writes go through
/// [`RegistrationStore::commit`].
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn find_registration(&self, id: Uuid)
        -> Result<Option<RegistrationRecord>, StoreError>;

    async fn find_team(&self, id: Uuid) -> Result<Option<Team>, StoreError>;

    /// Registrations whose team reference points at `team_id`
    async fn registrations_for_team(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<RegistrationRecord>, StoreError>;

    async fn list_registrations(
        &self,
        event_id: Option<Uuid>,
    ) -> Result<Vec<RegistrationRecord>, StoreError>;

    async fn list_teams(&self, event_id: Option<Uuid>) -> Result<Vec<Team>, StoreError>;

    async fn find_sportsperson(&self, id: Uuid) -> Result<Option<Sportsperson>, StoreError>;

    async fn find_sportspeople(&self, ids: &[Uuid]) -> Result<Vec<Sportsperson>, StoreError>;

    /// Applies a change set atomically
    ///
    /// Fails with [`StoreError::Conflict`] when a guarded team no longer
    /// satisfies the roster rules, or when a deleted team still has
    /// registrations pointing at it, and with [`StoreError::StaleWrite`]
    /// when a written team or registration changed since it was read.
    /// Nothing is written in either case.
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;
}
