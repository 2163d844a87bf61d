use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::Stores;
use crate::domain::discipline::Discipline;
use crate::domain::errors::RegistrationError;
use crate::domain::event::EventInfo;
use crate::domain::policy::Violation;
use crate::domain::registration::{RegistrationRecord, RegistrationStatus, Role};
use crate::domain::sportsperson::Sportsperson;
use crate::domain::team::{Roster, TeamStatus};

/// One registration as shown in queues and rosters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationView {
    pub registration_id: Uuid,
    pub sportsperson_id: Uuid,
    pub full_name: String,
    pub external_number: Option<String>,
    pub event_id: Uuid,
    pub event_name: String,
    pub team_id: Option<Uuid>,
    pub role: Role,
    pub status: RegistrationStatus,
    pub discipline: Discipline,
    pub paid: bool,
    pub cost: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A team with completeness recomputed from its members
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub team_id: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub event_id: Uuid,
    pub event_name: String,
    pub discipline: Discipline,
    pub is_complete: bool,
    pub status: TeamStatus,
    pub is_dragon_boat: bool,
    /// Why the team is incomplete
    pub reasons: Vec<Violation>,
    pub members: Vec<RegistrationView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleGroup {
    pub role: Role,
    pub members: Vec<RegistrationView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamDetails {
    #[serde(flatten)]
    pub summary: TeamSummary,
    pub roles: Vec<RoleGroup>,
}

/// Read-only projections over the registration store
#[derive(Clone)]
pub struct QueueView {
    stores: Stores,
}

/// Names needed to render registrations
struct Lookup {
    sportspeople: HashMap<Uuid, Sportsperson>,
    events: HashMap<Uuid, EventInfo>,
}

impl QueueView {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Individual registrations waiting in the queue, oldest first
    pub async fn list_queued_individuals(
        &self,
        event_id: Option<Uuid>,
    ) -> Result<Vec<RegistrationView>, RegistrationError> {
        let mut queued: Vec<RegistrationRecord> = self
            .stores
            .registrations
            .list_registrations(event_id)
            .await?
            .into_iter()
            .filter(|r| r.team_id().is_none() && r.status() == RegistrationStatus::Queued)
            .collect();
        queued.sort_by_key(|r| (r.created_at(), r.id()));

        let lookup = self.lookup(&queued).await?;
        Ok(queued.iter().map(|r| lookup.view(r)).collect())
    }

    /// Teams that are not complete, sorted by name
    pub async fn list_incomplete_teams(
        &self,
        event_id: Option<Uuid>,
    ) -> Result<Vec<TeamSummary>, RegistrationError> {
        let teams = self.stores.registrations.list_teams(event_id).await?;
        let mut by_team: HashMap<Uuid, Vec<RegistrationRecord>> = HashMap::new();
        for registration in self.stores.registrations.list_registrations(event_id).await? {
            if let Some(team_id) = registration.team_id() {
                by_team.entry(team_id).or_default().push(registration);
            }
        }

        let mut rosters = Vec::new();
        for team in teams {
            let members = by_team.remove(&team.id()).unwrap_or_default();
            let roster = Roster::from_parts(team, members)?;
            if !roster.computed_completeness() {
                rosters.push(roster);
            }
        }
        rosters.sort_by(|a, b| {
            (a.team().name(), a.team_id()).cmp(&(b.team().name(), b.team_id()))
        });

        let registrations: Vec<RegistrationRecord> = rosters
            .iter()
            .flat_map(|r| r.members().iter().cloned())
            .collect();
        let mut lookup = self.lookup(&registrations).await?;
        let event_ids = rosters.iter().map(|r| r.team().event_id()).collect();
        lookup.add_events(&self.stores, event_ids).await?;

        Ok(rosters.iter().map(|r| lookup.summary(r)).collect())
    }

    /// A team with its members grouped by role
    pub async fn get_team_details(&self, team_id: Uuid) -> Result<TeamDetails, RegistrationError> {
        let roster = self.stores.roster(team_id).await?;
        self.describe(&roster).await
    }

    /// Renders an already loaded roster
    pub async fn describe(&self, roster: &Roster) -> Result<TeamDetails, RegistrationError> {
        let mut lookup = self.lookup(roster.members()).await?;
        lookup
            .add_events(&self.stores, vec![roster.team().event_id()])
            .await?;

        let roles = roster
            .partitioned()
            .into_iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(role, members)| RoleGroup {
                role,
                members: members.into_iter().map(|m| lookup.view(m)).collect(),
            })
            .collect();

        Ok(TeamDetails {
            summary: lookup.summary(roster),
            roles,
        })
    }

    /// Renders a single registration
    pub async fn registration(
        &self,
        registration: &RegistrationRecord,
    ) -> Result<RegistrationView, RegistrationError> {
        let lookup = self.lookup(std::slice::from_ref(registration)).await?;
        Ok(lookup.view(registration))
    }

    async fn lookup(
        &self,
        registrations: &[RegistrationRecord],
    ) -> Result<Lookup, RegistrationError> {
        let mut sportsperson_ids: Vec<Uuid> =
            registrations.iter().map(|r| r.sportsperson_id()).collect();
        sportsperson_ids.sort();
        sportsperson_ids.dedup();

        let sportspeople = self
            .stores
            .registrations
            .find_sportspeople(&sportsperson_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let mut lookup = Lookup {
            sportspeople,
            events: HashMap::new(),
        };
        lookup
            .add_events(&self.stores, registrations.iter().map(|r| r.event_id()).collect())
            .await?;
        Ok(lookup)
    }
}

impl Lookup {
    async fn add_events(
        &mut self,
        stores: &Stores,
        mut ids: Vec<Uuid>,
    ) -> Result<(), RegistrationError> {
        ids.sort();
        ids.dedup();
        ids.retain(|id| !self.events.contains_key(id));
        if ids.is_empty() {
            return Ok(());
        }
        for event in stores.events.find_events(&ids).await? {
            self.events.insert(event.id, event);
        }
        Ok(())
    }

    fn event_name(&self, event_id: Uuid) -> String {
        self.events
            .get(&event_id)
            .map(|e| e.name.clone())
            .unwrap_or_default()
    }

    fn view(&self, registration: &RegistrationRecord) -> RegistrationView {
        let sportsperson = self.sportspeople.get(&registration.sportsperson_id());
        if sportsperson.is_none() {
            tracing::warn!(
                registration_id = %registration.id(),
                sportsperson_id = %registration.sportsperson_id(),
                "registration references unknown sportsperson"
            );
        }

        RegistrationView {
            registration_id: registration.id(),
            sportsperson_id: registration.sportsperson_id(),
            full_name: sportsperson.map(|s| s.full_name.clone()).unwrap_or_default(),
            external_number: sportsperson.and_then(|s| s.external_number.clone()),
            event_id: registration.event_id(),
            event_name: self.event_name(registration.event_id()),
            team_id: registration.team_id(),
            role: registration.role(),
            status: registration.status(),
            discipline: registration.discipline().clone(),
            paid: registration.paid(),
            cost: registration.cost(),
            created_at: registration.created_at(),
        }
    }

    fn summary(&self, roster: &Roster) -> TeamSummary {
        let team = roster.team();
        let is_complete = roster.computed_completeness();
        let reasons = roster.validation().into_violations();

        TeamSummary {
            team_id: team.id(),
            name: team.name().to_string(),
            city: team.city().map(str::to_string),
            event_id: team.event_id(),
            event_name: self.event_name(team.event_id()),
            discipline: team.discipline().clone(),
            is_complete,
            status: TeamStatus::derive(is_complete, roster.members().iter().map(|m| m.status())),
            is_dragon_boat: team.boat_class().is_dragon_boat(),
            reasons,
            members: roster.members().iter().map(|m| self.view(m)).collect(),
        }
    }
}
