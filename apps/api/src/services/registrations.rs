use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::roster_engine::{resolve_entrant, AddMember, TeamRosterEngine};
use super::{rejected, Stores};
use crate::domain::actor::ActorRole;
use crate::domain::discipline::Discipline;
use crate::domain::errors::RegistrationError;
use crate::domain::event::EventInfo;
use crate::domain::events::DomainEvent;
use crate::domain::registration::RegistrationRecord;
use crate::domain::repositories::ChangeSet;
use crate::domain::sportsperson::SportspersonDraft;
use crate::domain::team::events::TeamEvent;
use crate::domain::team::team::name_key;
use crate::domain::team::{Roster, Team};

/// Person behind an individual registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Registrant {
    Sportsperson { sportsperson_id: Uuid },
    Draft(SportspersonDraft),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRegistration {
    pub registrant: Registrant,
    pub event_id: Uuid,
    pub discipline: Discipline,
    #[serde(default)]
    pub cost: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationEdit {
    #[serde(default)]
    pub discipline: Option<Discipline>,
    #[serde(default)]
    pub cost: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTeam {
    pub event_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    pub discipline: Discipline,
    #[serde(default)]
    pub members: Vec<AddMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
}

/// Registration CRUD and team lifecycle
#[derive(Clone)]
pub struct RegistrationService {
    stores: Stores,
    roster_engine: TeamRosterEngine,
}

impl RegistrationService {
    pub fn new(stores: Stores) -> Self {
        Self {
            roster_engine: TeamRosterEngine::new(stores.clone()),
            stores,
        }
    }

    /// Registers a sportsperson individually, `queued` and unpaid
    pub async fn create_registration(
        &self,
        request: NewRegistration,
        actor: ActorRole,
    ) -> Result<RegistrationRecord, RegistrationError> {
        let result = self.try_create_registration(request).await;
        if let Ok(registration) = &result {
            tracing::info!(registration_id = %registration.id(), %actor, "registration created");
        }
        rejected("create_registration", result)
    }

    async fn try_create_registration(
        &self,
        request: NewRegistration,
    ) -> Result<RegistrationRecord, RegistrationError> {
        let event = self.open_event(request.event_id).await?;
        event.validate_discipline(&request.discipline)?;

        let mut changes = ChangeSet::new();
        let sportsperson_id = match request.registrant {
            Registrant::Sportsperson { sportsperson_id } => {
                self.stores
                    .registrations
                    .find_sportsperson(sportsperson_id)
                    .await?
                    .ok_or_else(|| RegistrationError::not_found("sportsperson", sportsperson_id))?;
                self.ensure_not_registered(&event, sportsperson_id, &request.discipline)
                    .await?;
                sportsperson_id
            }
            Registrant::Draft(draft) => {
                let sportsperson = draft.into_sportsperson()?;
                let id = sportsperson.id;
                changes.insert_sportsperson(sportsperson);
                id
            }
        };

        let (registration, events) = RegistrationRecord::new_individual(
            sportsperson_id,
            event.id,
            request.discipline,
            request.cost,
        )?;
        changes.save_registration(registration.clone());
        self.stores
            .commit(changes, events.into_iter().map(DomainEvent::from).collect())
            .await?;
        Ok(registration)
    }

    async fn ensure_not_registered(
        &self,
        event: &EventInfo,
        sportsperson_id: Uuid,
        discipline: &Discipline,
    ) -> Result<(), RegistrationError> {
        let existing = self
            .stores
            .registrations
            .list_registrations(Some(event.id))
            .await?;
        let duplicate = existing.iter().any(|r| {
            r.team_id().is_none()
                && r.sportsperson_id() == sportsperson_id
                && r.discipline().boat_class() == discipline.boat_class()
        });
        if duplicate {
            return Err(RegistrationError::validation(format!(
                "Sportsperson {} is already registered for {} in this event",
                sportsperson_id,
                discipline.boat_class()
            )));
        }
        Ok(())
    }

    /// Edits discipline and/or cost
    ///
    /// Discipline edits need an open event; a team member must stay in the
    /// team's boat class and sex category.
    pub async fn edit_registration(
        &self,
        registration_id: Uuid,
        edit: RegistrationEdit,
        actor: ActorRole,
    ) -> Result<RegistrationRecord, RegistrationError> {
        let result = self.try_edit_registration(registration_id, edit).await;
        if result.is_ok() {
            tracing::info!(%registration_id, %actor, "registration edited");
        }
        rejected("edit_registration", result)
    }

    async fn try_edit_registration(
        &self,
        registration_id: Uuid,
        edit: RegistrationEdit,
    ) -> Result<RegistrationRecord, RegistrationError> {
        let mut registration = self.stores.registration(registration_id).await?;
        if let Some(discipline) = &edit.discipline {
            let event = self.open_event(registration.event_id()).await?;
            event.validate_discipline(discipline)?;
        }

        match registration.team_id() {
            Some(team_id) => {
                let mut roster = self.stores.roster(team_id).await?;
                if let Some(discipline) = &edit.discipline {
                    if !discipline.same_category(roster.team().discipline()) {
                        return Err(RegistrationError::validation(format!(
                            "Team members race {}; the boat class and sex cannot change",
                            roster.team().discipline()
                        )));
                    }
                }
                let events = roster.update_member(registration_id, |member| {
                    apply_edit(member, edit)
                })?;
                self.stores
                    .commit_roster(&roster, ChangeSet::new(), events)
                    .await?;
                roster
                    .member(registration_id)
                    .cloned()
                    .ok_or_else(|| RegistrationError::not_found("registration", registration_id))
            }
            None => {
                let events = apply_edit(&mut registration, edit)?;
                let mut changes = ChangeSet::new();
                changes.save_registration(registration.clone());
                self.stores.commit(changes, events).await?;
                Ok(registration)
            }
        }
    }

    /// Deletes a registration; team members leave their roster first
    pub async fn delete_registration(
        &self,
        registration_id: Uuid,
        actor: ActorRole,
    ) -> Result<(), RegistrationError> {
        rejected("delete_registration", async {
            let registration = self.stores.registration(registration_id).await?;
            self.open_event(registration.event_id()).await?;

            match registration.team_id() {
                Some(team_id) => {
                    let roster = self.stores.roster(team_id).await?;
                    self.roster_engine.detach(roster, registration_id).await?;
                }
                None => {
                    let mut changes = ChangeSet::new();
                    changes.delete_registration(registration_id);
                    self.stores
                        .commit(changes, vec![registration.deleted_event().into()])
                        .await?;
                }
            }
            tracing::info!(%registration_id, %actor, "registration deleted");
            Ok(())
        }
        .await)
    }

    /// Creates a team with its initial roster
    pub async fn create_team(
        &self,
        request: NewTeam,
        actor: ActorRole,
    ) -> Result<Roster, RegistrationError> {
        let result = self.try_create_team(request).await;
        if let Ok(roster) = &result {
            tracing::info!(
                team_id = %roster.team_id(),
                members = roster.members().len(),
                %actor,
                "team created"
            );
        }
        rejected("create_team", result)
    }

    async fn try_create_team(&self, request: NewTeam) -> Result<Roster, RegistrationError> {
        let event = self.open_event(request.event_id).await?;
        event.validate_discipline(&request.discipline)?;
        self.ensure_unique_name(event.id, &request.name, None).await?;

        let (team, created) = Team::new(event.id, request.name, request.city, request.discipline)?;
        let mut roster = Roster::new(team);
        let mut changes = ChangeSet::new();
        let mut events: Vec<DomainEvent> = created.into_iter().map(DomainEvent::from).collect();

        for member in request.members {
            let registration = resolve_entrant(
                &self.stores,
                &roster,
                member.entrant,
                member.role,
                member.cost,
                &mut changes,
                &mut events,
            )
            .await?;
            events.extend(roster.add_member(registration, member.role)?);
        }
        events.extend(roster.refresh());

        changes.save_roster(&roster);
        self.stores.commit(changes, events).await?;
        Ok(roster)
    }

    /// Renames a team and sets its home city
    pub async fn update_team_info(
        &self,
        team_id: Uuid,
        info: TeamInfo,
        actor: ActorRole,
    ) -> Result<Roster, RegistrationError> {
        rejected("update_team_info", async {
            let mut roster = self.stores.roster(team_id).await?;
            self.ensure_unique_name(roster.team().event_id(), &info.name, Some(team_id))
                .await?;

            let mut events: Vec<DomainEvent> = Vec::new();
            let team = roster.team_mut();
            events.extend(team.rename(&info.name)?.map(DomainEvent::from));
            team.set_city(info.city);

            self.stores
                .commit_roster(&roster, ChangeSet::new(), events)
                .await?;
            tracing::info!(%team_id, %actor, "team info updated");
            Ok(roster)
        }
        .await)
    }

    /// Deletes a team together with all of its registrations
    pub async fn delete_team(
        &self,
        team_id: Uuid,
        actor: ActorRole,
    ) -> Result<(), RegistrationError> {
        rejected("delete_team", async {
            let (_, roster) = self.stores.open_roster(team_id).await?;
            let mut changes = ChangeSet::new();
            let mut events: Vec<DomainEvent> = Vec::new();

            for member in roster.members() {
                changes.delete_registration(member.id());
                events.push(member.deleted_event().into());
            }
            changes.delete_team(team_id);
            events.push(TeamEvent::Deleted { team_id }.into());

            self.stores.commit(changes, events).await?;
            tracing::info!(%team_id, members = roster.members().len(), %actor, "team deleted");
            Ok(())
        }
        .await)
    }

    async fn open_event(&self, event_id: Uuid) -> Result<EventInfo, RegistrationError> {
        let event = self.stores.event(event_id).await?;
        event.ensure_open()?;
        Ok(event)
    }

    async fn ensure_unique_name(
        &self,
        event_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<(), RegistrationError> {
        let taken: HashSet<String> = self
            .stores
            .registrations
            .list_teams(Some(event_id))
            .await?
            .iter()
            .filter(|t| Some(t.id()) != except)
            .map(Team::name_key)
            .collect();
        if taken.contains(&name_key(name)) {
            return Err(RegistrationError::validation(format!(
                "Team name '{}' is already used in this event",
                name.trim()
            )));
        }
        Ok(())
    }
}

fn apply_edit(
    registration: &mut RegistrationRecord,
    edit: RegistrationEdit,
) -> Result<Vec<DomainEvent>, RegistrationError> {
    if let Some(cost) = edit.cost {
        registration.set_cost(cost)?;
    }
    let mut events = Vec::new();
    if let Some(discipline) = edit.discipline {
        events.extend(registration.set_discipline(discipline).map(DomainEvent::from));
    }
    Ok(events)
}
