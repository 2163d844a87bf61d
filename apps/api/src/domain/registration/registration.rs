use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::events::RegistrationEvent;
use super::value_objects::{RegistrationStatus, Role};
use crate::domain::actor::ActorRole;
use crate::domain::discipline::Discipline;
use crate::domain::errors::RegistrationError;

/// One sportsperson's registration for one event
///
/// # Invariants
/// - `role != Role::None` exactly when the registration belongs to a team
/// - Cost is never negative
/// - Only team members are ever in `WaitingForTeam`
///
/// # Example
/// ```
/// use paddle_registry_api::domain::discipline::{BoatClass, Discipline, Distance, SexCategory};
/// use paddle_registry_api::domain::registration::RegistrationRecord;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let discipline = Discipline::new(BoatClass::K1, SexCategory::Women, [Distance::meters(200)])
///     .expect("valid discipline");
/// let (registration, events) = RegistrationRecord::new_individual(
///     Uuid::new_v4(),
///     Uuid::new_v4(),
///     discipline,
///     Decimal::from(1500),
/// )
/// .expect("valid registration");
///
/// assert!(registration.team_id().is_none());
/// assert_eq!(events.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRecord {
    id: Uuid,
    sportsperson_id: Uuid,
    event_id: Uuid,
    team_id: Option<Uuid>,
    role: Role,
    discipline: Discipline,
    status: RegistrationStatus,
    paid: bool,
    cost: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    stored_version: Option<DateTime<Utc>>,
}

impl RegistrationRecord {
    /// Creates an individual (non-team) registration in `Queued`
    pub fn new_individual(
        sportsperson_id: Uuid,
        event_id: Uuid,
        discipline: Discipline,
        cost: Decimal,
    ) -> Result<(Self, Vec<RegistrationEvent>), RegistrationError> {
        Self::create(sportsperson_id, event_id, None, Role::None, discipline, cost)
    }

    /// Creates a registration already attached to a team
    pub fn new_team_member(
        sportsperson_id: Uuid,
        event_id: Uuid,
        team_id: Uuid,
        role: Role,
        discipline: Discipline,
        cost: Decimal,
    ) -> Result<(Self, Vec<RegistrationEvent>), RegistrationError> {
        if !role.is_team_role() {
            return Err(RegistrationError::validation(
                "Team members need a team role",
            ));
        }
        Self::create(
            sportsperson_id,
            event_id,
            Some(team_id),
            role,
            discipline,
            cost,
        )
    }

    fn create(
        sportsperson_id: Uuid,
        event_id: Uuid,
        team_id: Option<Uuid>,
        role: Role,
        discipline: Discipline,
        cost: Decimal,
    ) -> Result<(Self, Vec<RegistrationEvent>), RegistrationError> {
        validate_cost(cost)?;

        let now = Utc::now();
        let registration = Self {
            id: Uuid::new_v4(),
            sportsperson_id,
            event_id,
            team_id,
            role,
            discipline,
            status: RegistrationStatus::Queued,
            paid: false,
            cost,
            created_at: now,
            updated_at: now,
            stored_version: None,
        };

        let events = vec![RegistrationEvent::Created {
            registration_id: registration.id,
            sportsperson_id,
            event_id,
            team_id,
        }];

        Ok((registration, events))
    }

    /// Applies an operator-requested status change
    ///
    /// # Business Rules
    /// - Target must be reachable per `RegistrationStatus::can_transition_to`
    /// - `WaitingForTeam` is never an operator target
    pub fn transition(
        &mut self,
        target: RegistrationStatus,
    ) -> Result<RegistrationEvent, RegistrationError> {
        if !self.status.can_transition_to(target) {
            return Err(RegistrationError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        Ok(self.set_status(target))
    }

    /// Confirms the registration as part of a whole-team confirmation
    ///
    /// Already confirmed and terminal registrations are left untouched.
    pub fn confirm_with_team(&mut self) -> Option<RegistrationEvent> {
        match self.status {
            RegistrationStatus::Queued | RegistrationStatus::WaitingForTeam => {
                Some(self.set_status(RegistrationStatus::Confirmed))
            }
            _ => None,
        }
    }

    /// Couples a queued member's status to its team's completeness
    pub fn sync_with_team(&mut self, team_complete: bool) -> Option<RegistrationEvent> {
        if self.team_id.is_none() {
            return None;
        }
        match (self.status, team_complete) {
            (RegistrationStatus::Queued, false) => {
                Some(self.set_status(RegistrationStatus::WaitingForTeam))
            }
            (RegistrationStatus::WaitingForTeam, true) => {
                Some(self.set_status(RegistrationStatus::Queued))
            }
            _ => None,
        }
    }

    fn set_status(&mut self, status: RegistrationStatus) -> RegistrationEvent {
        let from = self.status;
        self.status = status;
        self.touch();
        RegistrationEvent::StatusChanged {
            registration_id: self.id,
            from,
            to: status,
        }
    }

    /// Sets the payment flag
    ///
    /// # Business Rules
    /// - Any actor may mark a registration paid
    /// - Only privileged actors may revoke a payment
    /// - Setting the current value is a no-op
    pub fn set_paid(
        &mut self,
        paid: bool,
        actor: ActorRole,
    ) -> Result<Option<RegistrationEvent>, RegistrationError> {
        if self.paid == paid {
            return Ok(None);
        }
        if !paid && !actor.can_revoke_payment() {
            return Err(RegistrationError::PaymentDowngradeDenied {
                registration_id: self.id,
                actor,
            });
        }

        self.paid = paid;
        self.touch();
        Ok(Some(RegistrationEvent::PaymentChanged {
            registration_id: self.id,
            paid,
            actor,
        }))
    }

    pub fn set_cost(&mut self, cost: Decimal) -> Result<(), RegistrationError> {
        validate_cost(cost)?;
        self.cost = cost;
        self.touch();
        Ok(())
    }

    pub fn set_discipline(&mut self, discipline: Discipline) -> Option<RegistrationEvent> {
        if self.discipline == discipline {
            return None;
        }
        self.discipline = discipline;
        self.touch();
        Some(RegistrationEvent::DisciplineChanged {
            registration_id: self.id,
        })
    }

    /// Attaches an individual registration to a team
    ///
    /// The registration takes over the team's discipline.
    pub fn join_team(
        &mut self,
        team_id: Uuid,
        role: Role,
        discipline: Discipline,
    ) -> Result<Vec<RegistrationEvent>, RegistrationError> {
        if let Some(current) = self.team_id {
            return Err(RegistrationError::validation(format!(
                "Registration {} already belongs to team {}",
                self.id, current
            )));
        }
        if !role.is_team_role() {
            return Err(RegistrationError::validation(
                "Team members need a team role",
            ));
        }

        self.team_id = Some(team_id);
        let mut events = Vec::with_capacity(2);
        if let Some(event) = self.change_role(role) {
            events.push(event);
        }
        if let Some(event) = self.set_discipline(discipline) {
            events.push(event);
        }
        self.touch();
        Ok(events)
    }

    /// Moves the registration to another team, keeping its role
    pub fn move_to_team(
        &mut self,
        team_id: Uuid,
        discipline: Discipline,
    ) -> Vec<RegistrationEvent> {
        self.team_id = Some(team_id);
        self.touch();
        self.set_discipline(discipline).into_iter().collect()
    }

    /// Changes the role of a team member
    pub fn change_role(&mut self, role: Role) -> Option<RegistrationEvent> {
        if self.role == role {
            return None;
        }
        let from = self.role;
        self.role = role;
        self.touch();
        Some(RegistrationEvent::RoleChanged {
            registration_id: self.id,
            from,
            to: role,
        })
    }

    pub fn deleted_event(&self) -> RegistrationEvent {
        RegistrationEvent::Deleted {
            registration_id: self.id,
        }
    }

    // Stored timestamps keep microseconds; every change must move past them
    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at + Duration::microseconds(1));
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sportsperson_id(&self) -> Uuid {
        self.sportsperson_id
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn team_id(&self) -> Option<Uuid> {
        self.team_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn discipline(&self) -> &Discipline {
        &self.discipline
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status
    }

    pub fn paid(&self) -> bool {
        self.paid
    }

    pub fn cost(&self) -> Decimal {
        self.cost
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// `updated_at` of the committed row this registration was read from
    ///
    /// `None` until the registration has been stored.
    pub fn stored_version(&self) -> Option<DateTime<Utc>> {
        self.stored_version
    }

    /// Whether anything changed since the registration was read
    pub fn has_changes(&self) -> bool {
        self.stored_version != Some(self.updated_at)
    }

    /// Records the current state as committed; only for repository implementations
    pub fn mark_stored(&mut self) {
        self.stored_version = Some(self.updated_at);
    }

    /// Reconstructs a registration from stored data
    ///
    /// Only for repository implementations; stored rows are already validated.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        sportsperson_id: Uuid,
        event_id: Uuid,
        team_id: Option<Uuid>,
        role: Role,
        discipline: Discipline,
        status: RegistrationStatus,
        paid: bool,
        cost: Decimal,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sportsperson_id,
            event_id,
            team_id,
            role,
            discipline,
            status,
            paid,
            cost,
            created_at,
            updated_at,
            stored_version: Some(updated_at),
        }
    }
}

fn validate_cost(cost: Decimal) -> Result<(), RegistrationError> {
    if cost < Decimal::ZERO {
        return Err(RegistrationError::validation("Cost cannot be negative"));
    }
    Ok(())
}
