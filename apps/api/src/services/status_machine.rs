use uuid::Uuid;

use super::{rejected, Stores};
use crate::domain::actor::ActorRole;
use crate::domain::errors::RegistrationError;
use crate::domain::registration::{RegistrationRecord, RegistrationStatus};
use crate::domain::repositories::ChangeSet;

/// Status and payment workflow for registrations and whole teams
///
/// Not gated on the event status: check-in and payment happen after
/// registration has closed.
#[derive(Clone)]
pub struct RegistrationStatusMachine {
    stores: Stores,
}

impl RegistrationStatusMachine {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Moves a registration to `target`
    ///
    /// For team members the team's completeness and aggregate status are
    /// recomputed in the same commit.
    pub async fn transition(
        &self,
        registration_id: Uuid,
        target: RegistrationStatus,
        actor: ActorRole,
    ) -> Result<RegistrationRecord, RegistrationError> {
        rejected("transition", async {
            let mut registration = self.stores.registration(registration_id).await?;
            tracing::debug!(
                %registration_id,
                from = %registration.status(),
                to = %target,
                %actor,
                "status transition"
            );

            match registration.team_id() {
                Some(team_id) => {
                    let mut roster = self.stores.roster(team_id).await?;
                    let events = roster.transition_member(registration_id, target)?;
                    self.stores
                        .commit_roster(&roster, ChangeSet::new(), events)
                        .await?;
                    roster.member(registration_id).cloned().ok_or_else(|| {
                        RegistrationError::not_found("registration", registration_id)
                    })
                }
                None => {
                    let event = registration.transition(target)?;
                    let mut changes = ChangeSet::new();
                    changes.save_registration(registration.clone());
                    self.stores.commit(changes, vec![event.into()]).await?;
                    Ok(registration)
                }
            }
        }
        .await)
    }

    /// Confirms every member of a complete team, returning how many changed
    pub async fn confirm_team(
        &self,
        team_id: Uuid,
        actor: ActorRole,
    ) -> Result<usize, RegistrationError> {
        rejected("confirm_team", async {
            let mut roster = self.stores.roster(team_id).await?;
            let (confirmed, events) = roster.confirm_all()?;
            if confirmed > 0 {
                self.stores
                    .commit_roster(&roster, ChangeSet::new(), events)
                    .await?;
            }
            tracing::info!(%team_id, confirmed, %actor, "team confirmed");
            Ok(confirmed)
        }
        .await)
    }

    /// Sets the payment flag of one registration
    pub async fn set_payment(
        &self,
        registration_id: Uuid,
        paid: bool,
        actor: ActorRole,
    ) -> Result<RegistrationRecord, RegistrationError> {
        rejected("set_payment", async {
            let mut registration = self.stores.registration(registration_id).await?;
            if let Some(event) = registration.set_paid(paid, actor)? {
                let mut changes = ChangeSet::new();
                changes.save_registration(registration.clone());
                self.stores.commit(changes, vec![event.into()]).await?;
            }
            Ok(registration)
        }
        .await)
    }

    /// Marks every member of a complete team as paid, returning how many changed
    pub async fn confirm_team_payment(
        &self,
        team_id: Uuid,
        actor: ActorRole,
    ) -> Result<usize, RegistrationError> {
        rejected("confirm_team_payment", async {
            let mut roster = self.stores.roster(team_id).await?;
            let (paid, events) = roster.mark_all_paid(actor)?;
            if paid > 0 {
                self.stores
                    .commit_roster(&roster, ChangeSet::new(), events)
                    .await?;
            }
            tracing::info!(%team_id, paid, %actor, "team payment confirmed");
            Ok(paid)
        }
        .await)
    }
}
