use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::event::EventInfo;
use crate::domain::policy::Violation;
use crate::domain::registration::RegistrationRecord;
use crate::domain::repositories::{
    check_roster_guard, ChangeSet, EventDirectory, RegistrationStore, StoreError,
};
use crate::domain::sportsperson::Sportsperson;
use crate::domain::team::Team;

#[derive(Debug, Clone, Default)]
struct State {
    sportspeople: HashMap<Uuid, Sportsperson>,
    teams: HashMap<Uuid, Team>,
    registrations: HashMap<Uuid, RegistrationRecord>,
    events: HashMap<Uuid, EventInfo>,
}

impl State {
    fn team_members(&self, team_id: Uuid) -> Vec<RegistrationRecord> {
        let mut members: Vec<RegistrationRecord> = self
            .registrations
            .values()
            .filter(|r| r.team_id() == Some(team_id))
            .cloned()
            .collect();
        members.sort_by_key(|r| (r.created_at(), r.id()));
        members
    }

    fn apply(&mut self, changes: ChangeSet) -> Result<(), StoreError> {
        for sportsperson in changes.sportspeople {
            self.sportspeople.insert(sportsperson.id, sportsperson);
        }
        for mut team in changes.teams {
            let current = self.teams.get(&team.id()).map(Team::updated_at);
            if current != team.stored_version() {
                return Err(StoreError::StaleWrite {
                    entity: "team",
                    id: team.id(),
                });
            }
            team.mark_stored();
            self.teams.insert(team.id(), team);
        }
        for mut registration in changes.registrations {
            let current = self
                .registrations
                .get(&registration.id())
                .map(RegistrationRecord::updated_at);
            if current != registration.stored_version() {
                return Err(StoreError::StaleWrite {
                    entity: "registration",
                    id: registration.id(),
                });
            }
            registration.mark_stored();
            self.registrations.insert(registration.id(), registration);
        }
        for id in &changes.deleted_registrations {
            self.registrations.remove(id);
        }
        for team_id in &changes.deleted_teams {
            if self
                .registrations
                .values()
                .any(|r| r.team_id() == Some(*team_id))
            {
                return Err(StoreError::Conflict {
                    violations: vec![Violation::RosterOutOfSync { team_id: *team_id }],
                });
            }
            self.teams.remove(team_id);
        }

        let mut violations = Vec::new();
        for team_id in &changes.guarded_teams {
            if let Some(team) = self.teams.get(team_id) {
                violations.extend(check_roster_guard(team, &self.team_members(*team_id)));
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Conflict { violations })
        }
    }
}

/// Process-local store used when no database is configured and in tests
///
/// Commits apply to a copy of the state which replaces the original only
/// when every version check and guard passes.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an event; events are owned elsewhere in production
    pub fn insert_event(&self, event: EventInfo) -> Result<(), StoreError> {
        self.lock()?.events.insert(event.id, event);
        Ok(())
    }

    pub fn insert_sportsperson(&self, sportsperson: Sportsperson) -> Result<(), StoreError> {
        self.lock()?
            .sportspeople
            .insert(sportsperson.id, sportsperson);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Database("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn find_registration(
        &self,
        id: Uuid,
    ) -> Result<Option<RegistrationRecord>, StoreError> {
        Ok(self.lock()?.registrations.get(&id).cloned())
    }

    async fn find_team(&self, id: Uuid) -> Result<Option<Team>, StoreError> {
        Ok(self.lock()?.teams.get(&id).cloned())
    }

    async fn registrations_for_team(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<RegistrationRecord>, StoreError> {
        Ok(self.lock()?.team_members(team_id))
    }

    async fn list_registrations(
        &self,
        event_id: Option<Uuid>,
    ) -> Result<Vec<RegistrationRecord>, StoreError> {
        let state = self.lock()?;
        let mut registrations: Vec<RegistrationRecord> = state
            .registrations
            .values()
            .filter(|r| event_id.map_or(true, |id| r.event_id() == id))
            .cloned()
            .collect();
        registrations.sort_by_key(|r| (r.created_at(), r.id()));
        Ok(registrations)
    }

    async fn list_teams(&self, event_id: Option<Uuid>) -> Result<Vec<Team>, StoreError> {
        let state = self.lock()?;
        let mut teams: Vec<Team> = state
            .teams
            .values()
            .filter(|t| event_id.map_or(true, |id| t.event_id() == id))
            .cloned()
            .collect();
        teams.sort_by_key(|t| (t.created_at(), t.id()));
        Ok(teams)
    }

    async fn find_sportsperson(&self, id: Uuid) -> Result<Option<Sportsperson>, StoreError> {
        Ok(self.lock()?.sportspeople.get(&id).cloned())
    }

    async fn find_sportspeople(&self, ids: &[Uuid]) -> Result<Vec<Sportsperson>, StoreError> {
        let state = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.sportspeople.get(id).cloned())
            .collect())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let mut next = state.clone();
        next.apply(changes)?;
        *state = next;
        Ok(())
    }
}

#[async_trait]
impl EventDirectory for InMemoryStore {
    async fn find_event(&self, id: Uuid) -> Result<Option<EventInfo>, StoreError> {
        Ok(self.lock()?.events.get(&id).cloned())
    }

    async fn find_events(&self, ids: &[Uuid]) -> Result<Vec<EventInfo>, StoreError> {
        let state = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.events.get(id).cloned())
            .collect())
    }
}
