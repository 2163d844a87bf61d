use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{rejected, Stores};
use crate::domain::actor::ActorRole;
use crate::domain::errors::RegistrationError;
use crate::domain::events::DomainEvent;
use crate::domain::registration::{RegistrationRecord, Role};
use crate::domain::repositories::ChangeSet;
use crate::domain::sportsperson::SportspersonDraft;
use crate::domain::team::events::TeamEvent;
use crate::domain::team::{RoleChange, Roster};

/// Who is being added to a roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entrant {
    /// An existing individual registration of the same event
    Registration { registration_id: Uuid },
    /// A known sportsperson without a registration for this team
    Sportsperson { sportsperson_id: Uuid },
    /// Someone new to the registry
    Draft(SportspersonDraft),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMember {
    pub entrant: Entrant,
    pub role: Role,
    #[serde(default)]
    pub cost: Option<Decimal>,
}

/// Role assignment and membership changes for teams
///
/// Every call requires the team's event to be open for registration and
/// commits the resulting roster as one change set.
#[derive(Clone)]
pub struct TeamRosterEngine {
    stores: Stores,
}

impl TeamRosterEngine {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Moves a registration to `role`, attaching it first if it is an
    /// individual registration of the same event
    pub async fn assign_role(
        &self,
        team_id: Uuid,
        registration_id: Uuid,
        role: Role,
        actor: ActorRole,
    ) -> Result<Roster, RegistrationError> {
        let result = self.try_assign_role(team_id, registration_id, role).await;
        if result.is_ok() {
            tracing::info!(%team_id, %registration_id, %role, %actor, "role assigned");
        }
        rejected("assign_role", result)
    }

    async fn try_assign_role(
        &self,
        team_id: Uuid,
        registration_id: Uuid,
        role: Role,
    ) -> Result<Roster, RegistrationError> {
        let (_, mut roster) = self.stores.open_roster(team_id).await?;

        let events = if roster.member(registration_id).is_some() {
            roster.assign_role(registration_id, role)?
        } else {
            let registration = self.stores.registration(registration_id).await?;
            if registration.team_id().is_some() {
                return Err(RegistrationError::validation(format!(
                    "Registration {} belongs to another team",
                    registration_id
                )));
            }
            roster.add_member(registration, role)?
        };

        self.stores
            .commit_roster(&roster, ChangeSet::new(), events)
            .await?;
        Ok(roster)
    }

    /// Applies several role changes, validating only the final roster
    pub async fn apply_batch(
        &self,
        team_id: Uuid,
        changes: &[RoleChange],
        actor: ActorRole,
    ) -> Result<Roster, RegistrationError> {
        rejected("apply_batch", async {
            let (_, mut roster) = self.stores.open_roster(team_id).await?;
            let events = roster.apply_batch(changes)?;
            self.stores
                .commit_roster(&roster, ChangeSet::new(), events)
                .await?;
            tracing::info!(%team_id, changes = changes.len(), %actor, "role batch applied");
            Ok(roster)
        }
        .await)
    }

    /// Adds an existing registration, a known sportsperson or a draft
    pub async fn add_member(
        &self,
        team_id: Uuid,
        request: AddMember,
        actor: ActorRole,
    ) -> Result<Roster, RegistrationError> {
        let role = request.role;
        let result = self.try_add_member(team_id, request).await;
        if result.is_ok() {
            tracing::info!(%team_id, %role, %actor, "member added");
        }
        rejected("add_member", result)
    }

    async fn try_add_member(
        &self,
        team_id: Uuid,
        request: AddMember,
    ) -> Result<Roster, RegistrationError> {
        let (_, mut roster) = self.stores.open_roster(team_id).await?;
        let mut changes = ChangeSet::new();
        let mut events: Vec<DomainEvent> = Vec::new();

        let registration = resolve_entrant(
            &self.stores,
            &roster,
            request.entrant,
            request.role,
            request.cost,
            &mut changes,
            &mut events,
        )
        .await?;

        events.extend(roster.add_member(registration, request.role)?);
        self.stores.commit_roster(&roster, changes, events).await?;
        Ok(roster)
    }

    /// Detaches and deletes a member's registration
    ///
    /// Returns `None` when the team was deleted because it became empty.
    pub async fn remove_member(
        &self,
        team_id: Uuid,
        registration_id: Uuid,
        actor: ActorRole,
    ) -> Result<Option<Roster>, RegistrationError> {
        rejected("remove_member", async {
            let (_, roster) = self.stores.open_roster(team_id).await?;
            let remaining = self.detach(roster, registration_id).await?;
            tracing::info!(
                %team_id,
                %registration_id,
                team_deleted = remaining.is_none(),
                %actor,
                "member removed"
            );
            Ok(remaining)
        }
        .await)
    }

    /// Removes a member from an already loaded roster and commits
    pub(crate) async fn detach(
        &self,
        mut roster: Roster,
        registration_id: Uuid,
    ) -> Result<Option<Roster>, RegistrationError> {
        let (removed, mut events) = roster.remove_member(registration_id)?;
        let mut changes = ChangeSet::new();
        changes.delete_registration(removed.id());

        if roster.is_empty() {
            events.push(
                TeamEvent::Deleted {
                    team_id: roster.team_id(),
                }
                .into(),
            );
        }
        self.stores.commit_roster(&roster, changes, events).await?;

        Ok((!roster.is_empty()).then_some(roster))
    }

    /// Hands out dragon-boat roles in roster order
    pub async fn auto_assign_roles(
        &self,
        team_id: Uuid,
        actor: ActorRole,
    ) -> Result<Roster, RegistrationError> {
        rejected("auto_assign_roles", async {
            let (_, mut roster) = self.stores.open_roster(team_id).await?;
            let events = roster.auto_assign_roles()?;
            self.stores
                .commit_roster(&roster, ChangeSet::new(), events)
                .await?;
            tracing::info!(%team_id, %actor, "roles auto-assigned");
            Ok(roster)
        }
        .await)
    }
}

/// Turns an entrant into a registration ready to join `roster`
///
/// New sportspeople are queued on `changes`; creation events on `events`.
pub(crate) async fn resolve_entrant(
    stores: &Stores,
    roster: &Roster,
    entrant: Entrant,
    role: Role,
    cost: Option<Decimal>,
    changes: &mut ChangeSet,
    events: &mut Vec<DomainEvent>,
) -> Result<RegistrationRecord, RegistrationError> {
    match entrant {
        Entrant::Registration { registration_id } => {
            let mut registration = stores.registration(registration_id).await?;
            if let Some(cost) = cost {
                registration.set_cost(cost)?;
            }
            Ok(registration)
        }
        Entrant::Sportsperson { sportsperson_id } => {
            stores
                .registrations
                .find_sportsperson(sportsperson_id)
                .await?
                .ok_or_else(|| RegistrationError::not_found("sportsperson", sportsperson_id))?;
            ensure_not_entered(stores, roster, sportsperson_id).await?;
            new_member(roster, sportsperson_id, role, cost.unwrap_or(Decimal::ZERO), events)
        }
        Entrant::Draft(draft) => {
            let sportsperson = draft.into_sportsperson()?;
            let registration = new_member(
                roster,
                sportsperson.id,
                role,
                cost.unwrap_or(Decimal::ZERO),
                events,
            )?;
            changes.insert_sportsperson(sportsperson);
            Ok(registration)
        }
    }
}

/// Rejects a sportsperson already entered in the team's event and boat class
///
/// Members of `roster` itself are left to the roster's duplicate check.
async fn ensure_not_entered(
    stores: &Stores,
    roster: &Roster,
    sportsperson_id: Uuid,
) -> Result<(), RegistrationError> {
    let team = roster.team();
    let existing = stores
        .registrations
        .list_registrations(Some(team.event_id()))
        .await?;
    let Some(entered) = existing.iter().find(|r| {
        r.sportsperson_id() == sportsperson_id
            && r.discipline().boat_class() == team.boat_class()
            && r.team_id() != Some(team.id())
    }) else {
        return Ok(());
    };

    Err(RegistrationError::validation(match entered.team_id() {
        Some(other) => format!(
            "Sportsperson {} already races {} for team {}",
            sportsperson_id,
            team.boat_class(),
            other
        ),
        None => format!(
            "Sportsperson {} is already registered for {}; add registration {} instead",
            sportsperson_id,
            team.boat_class(),
            entered.id()
        ),
    }))
}

fn new_member(
    roster: &Roster,
    sportsperson_id: Uuid,
    role: Role,
    cost: Decimal,
    events: &mut Vec<DomainEvent>,
) -> Result<RegistrationRecord, RegistrationError> {
    let team = roster.team();
    let (registration, created) = RegistrationRecord::new_team_member(
        sportsperson_id,
        team.event_id(),
        team.id(),
        role,
        team.discipline().clone(),
        cost,
    )?;
    events.extend(created.into_iter().map(DomainEvent::from));
    Ok(registration)
}
