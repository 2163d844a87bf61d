use std::collections::HashSet;
use uuid::Uuid;

use super::{rejected, Stores};
use crate::domain::actor::ActorRole;
use crate::domain::errors::RegistrationError;
use crate::domain::events::DomainEvent;
use crate::domain::repositories::ChangeSet;
use crate::domain::team::team::name_key;
use crate::domain::team::Roster;

/// Combines several teams of one event into a single crew
#[derive(Clone)]
pub struct TeamMergeService {
    stores: Stores,
}

impl TeamMergeService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Moves every member of `secondary_ids` into the primary team
    ///
    /// All incompatibilities are collected into one `CapacityViolation`;
    /// on any failure nothing is written.
    pub async fn merge(
        &self,
        primary_id: Uuid,
        secondary_ids: &[Uuid],
        new_name: Option<String>,
        actor: ActorRole,
    ) -> Result<Roster, RegistrationError> {
        rejected(
            "merge",
            self.try_merge(primary_id, secondary_ids, new_name, actor).await,
        )
    }

    async fn try_merge(
        &self,
        primary_id: Uuid,
        secondary_ids: &[Uuid],
        new_name: Option<String>,
        actor: ActorRole,
    ) -> Result<Roster, RegistrationError> {
        validate_ids(primary_id, secondary_ids)?;

        let (event, mut primary) = self.stores.open_roster(primary_id).await?;
        let mut secondaries = Vec::with_capacity(secondary_ids.len());
        for id in secondary_ids {
            secondaries.push(self.stores.roster(*id).await?);
        }

        let mut events: Vec<DomainEvent> = Vec::new();
        if let Some(name) = new_name {
            let taken: HashSet<String> = self
                .stores
                .registrations
                .list_teams(Some(event.id))
                .await?
                .iter()
                .filter(|t| t.id() != primary_id && !secondary_ids.contains(&t.id()))
                .map(|t| t.name_key())
                .collect();
            if taken.contains(&name_key(&name)) {
                return Err(RegistrationError::validation(format!(
                    "Team name '{}' is already used in this event",
                    name.trim()
                )));
            }
            events.extend(primary.team_mut().rename(&name)?.map(DomainEvent::from));
        }

        let (absorbed, merged) = primary.absorb(secondaries)?;
        events.extend(merged);

        let mut changes = ChangeSet::new();
        changes.save_roster(&primary);
        for team_id in &absorbed {
            changes.delete_team(*team_id);
        }
        self.stores.commit(changes, events).await?;

        tracing::info!(
            team_id = %primary_id,
            absorbed = absorbed.len(),
            %actor,
            "teams merged"
        );
        Ok(primary)
    }
}

fn validate_ids(primary_id: Uuid, secondary_ids: &[Uuid]) -> Result<(), RegistrationError> {
    if secondary_ids.is_empty() {
        return Err(RegistrationError::validation(
            "Merge needs at least one secondary team",
        ));
    }
    if secondary_ids.contains(&primary_id) {
        return Err(RegistrationError::validation(
            "A team cannot be merged into itself",
        ));
    }
    let unique: HashSet<&Uuid> = secondary_ids.iter().collect();
    if unique.len() != secondary_ids.len() {
        return Err(RegistrationError::validation(
            "Secondary teams must not repeat",
        ));
    }
    Ok(())
}
