// Application services
// Load aggregates through the repository ports, run the domain logic and
// commit the resulting change set atomically.

pub mod merge;
pub mod queue_view;
pub mod registrations;
pub mod roster_engine;
pub mod status_machine;

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::RegistrationError;
use crate::domain::event::EventInfo;
use crate::domain::events::{log_committed, DomainEvent};
use crate::domain::registration::RegistrationRecord;
use crate::domain::repositories::{ChangeSet, EventDirectory, RegistrationStore};
use crate::domain::team::Roster;

pub use merge::TeamMergeService;
pub use queue_view::QueueView;
pub use registrations::RegistrationService;
pub use roster_engine::TeamRosterEngine;
pub use status_machine::RegistrationStatusMachine;

/// Shared handles to the persistence adapters
#[derive(Clone)]
pub struct Stores {
    pub registrations: Arc<dyn RegistrationStore>,
    pub events: Arc<dyn EventDirectory>,
}

impl Stores {
    pub fn new(
        registrations: Arc<dyn RegistrationStore>,
        events: Arc<dyn EventDirectory>,
    ) -> Self {
        Self {
            registrations,
            events,
        }
    }

    pub(crate) async fn event(&self, id: Uuid) -> Result<EventInfo, RegistrationError> {
        self.events
            .find_event(id)
            .await?
            .ok_or_else(|| RegistrationError::not_found("event", id))
    }

    pub(crate) async fn registration(
        &self,
        id: Uuid,
    ) -> Result<RegistrationRecord, RegistrationError> {
        self.registrations
            .find_registration(id)
            .await?
            .ok_or_else(|| RegistrationError::not_found("registration", id))
    }

    /// Loads a team with every registration pointing at it
    pub(crate) async fn roster(&self, team_id: Uuid) -> Result<Roster, RegistrationError> {
        let team = self
            .registrations
            .find_team(team_id)
            .await?
            .ok_or_else(|| RegistrationError::not_found("team", team_id))?;
        let members = self.registrations.registrations_for_team(team_id).await?;
        Roster::from_parts(team, members)
    }

    /// Loads a roster and checks its event accepts structural changes
    pub(crate) async fn open_roster(
        &self,
        team_id: Uuid,
    ) -> Result<(EventInfo, Roster), RegistrationError> {
        let roster = self.roster(team_id).await?;
        let event = self.event(roster.team().event_id()).await?;
        event.ensure_open()?;
        Ok((event, roster))
    }

    /// Commits the change set, then logs the events it produced
    pub(crate) async fn commit(
        &self,
        changes: ChangeSet,
        events: Vec<DomainEvent>,
    ) -> Result<(), RegistrationError> {
        if changes.is_empty() {
            return Ok(());
        }
        self.registrations.commit(changes).await?;
        log_committed(&events);
        Ok(())
    }

    /// Persists a mutated roster, deleting the team once it is empty
    pub(crate) async fn commit_roster(
        &self,
        roster: &Roster,
        mut changes: ChangeSet,
        events: Vec<DomainEvent>,
    ) -> Result<(), RegistrationError> {
        if roster.is_empty() {
            changes.delete_team(roster.team_id());
        } else {
            changes.save_roster(roster);
        }
        self.commit(changes, events).await
    }
}

/// Logs a rejected operation before handing the error back
pub(crate) fn rejected<T>(
    operation: &'static str,
    result: Result<T, RegistrationError>,
) -> Result<T, RegistrationError> {
    if let Err(err) = &result {
        tracing::warn!(operation, error = %err, "operation rejected");
    }
    result
}
