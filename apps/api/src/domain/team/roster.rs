use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

use super::events::TeamEvent;
use super::team::Team;
use super::value_objects::TeamStatus;
use crate::domain::actor::ActorRole;
use crate::domain::errors::RegistrationError;
use crate::domain::events::DomainEvent;
use crate::domain::policy::{RoleCounts, RosterCapacityPolicy, ValidationResult, Violation};
use crate::domain::registration::{RegistrationRecord, RegistrationStatus, Role};

/// One requested role change inside a roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChange {
    pub registration_id: Uuid,
    pub role: Role,
}

impl RoleChange {
    pub fn new(registration_id: Uuid, role: Role) -> Self {
        Self {
            registration_id,
            role,
        }
    }
}

/// A team together with its member registrations
///
/// Every mutation validates the resulting roster first and only then
/// touches state, so a failed call leaves the roster exactly as it was.
/// Successful mutations end with [`Roster::refresh`].
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    team: Team,
    members: Vec<RegistrationRecord>,
}

impl Roster {
    /// Roster of a team that has no members yet
    pub fn new(team: Team) -> Self {
        Self {
            team,
            members: Vec::new(),
        }
    }

    /// Assembles a loaded team and its registrations
    ///
    /// Members follow the team's stored order; registrations missing from
    /// that order are appended, stale ids are dropped.
    pub fn from_parts(
        mut team: Team,
        registrations: Vec<RegistrationRecord>,
    ) -> Result<Self, RegistrationError> {
        if let Some(stray) = registrations
            .iter()
            .find(|r| r.team_id() != Some(team.id()))
        {
            return Err(RegistrationError::validation(format!(
                "Registration {} does not belong to team {}",
                stray.id(),
                team.id()
            )));
        }

        let mut by_id: HashMap<Uuid, RegistrationRecord> =
            registrations.into_iter().map(|r| (r.id(), r)).collect();
        let mut members = Vec::with_capacity(by_id.len());
        for id in team.members().to_vec() {
            match by_id.remove(&id) {
                Some(registration) => members.push(registration),
                None => {
                    team.remove_member(id);
                }
            }
        }

        let mut extras: Vec<RegistrationRecord> = by_id.into_values().collect();
        extras.sort_by_key(|r| (r.created_at(), r.id()));
        for registration in extras {
            team.push_member(registration.id());
            members.push(registration);
        }

        Ok(Self { team, members })
    }

    // ===== Queries =====

    pub fn team(&self) -> &Team {
        &self.team
    }

    pub fn team_id(&self) -> Uuid {
        self.team.id()
    }

    pub fn members(&self) -> &[RegistrationRecord] {
        &self.members
    }

    pub fn member(&self, registration_id: Uuid) -> Option<&RegistrationRecord> {
        self.members.iter().find(|m| m.id() == registration_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn into_parts(self) -> (Team, Vec<RegistrationRecord>) {
        (self.team, self.members)
    }

    pub fn role_counts(&self) -> RoleCounts {
        self.members.iter().map(RegistrationRecord::role).collect()
    }

    /// Full policy check of the current roster
    pub fn validation(&self) -> ValidationResult {
        RosterCapacityPolicy::validate_roster(self.team.boat_class(), &self.role_counts())
    }

    /// Completeness computed from the members, ignoring the stored flag
    pub fn computed_completeness(&self) -> bool {
        !self.is_empty() && self.validation().is_ok()
    }

    pub fn contains_sportsperson(&self, sportsperson_id: Uuid) -> bool {
        self.members
            .iter()
            .any(|m| m.sportsperson_id() == sportsperson_id)
    }

    /// Members grouped by role in display order
    pub fn partitioned(&self) -> Vec<(Role, Vec<&RegistrationRecord>)> {
        Role::TEAM_ROLES
            .into_iter()
            .map(|role| {
                let members = self.members.iter().filter(|m| m.role() == role).collect();
                (role, members)
            })
            .collect()
    }

    // ===== Roster mutations =====

    /// Moves one member to a new role
    pub fn assign_role(
        &mut self,
        registration_id: Uuid,
        role: Role,
    ) -> Result<Vec<DomainEvent>, RegistrationError> {
        self.apply_batch(&[RoleChange::new(registration_id, role)])
    }

    /// Applies several role changes as one unit
    ///
    /// Only the final distribution is validated, so swaps that would be
    /// invalid step by step are accepted.
    pub fn apply_batch(
        &mut self,
        changes: &[RoleChange],
    ) -> Result<Vec<DomainEvent>, RegistrationError> {
        let mut targets: HashMap<Uuid, Role> = HashMap::with_capacity(changes.len());
        for change in changes {
            if !change.role.is_team_role() {
                return Err(RegistrationError::validation(
                    "Team members need a team role",
                ));
            }
            if self.member(change.registration_id).is_none() {
                return Err(RegistrationError::validation(format!(
                    "Registration {} is not a member of team {}",
                    change.registration_id,
                    self.team.id()
                )));
            }
            if targets.insert(change.registration_id, change.role).is_some() {
                return Err(RegistrationError::validation(format!(
                    "Registration {} appears twice in the batch",
                    change.registration_id
                )));
            }
        }

        let before = self.role_counts();
        let after: RoleCounts = self
            .members
            .iter()
            .map(|m| targets.get(&m.id()).copied().unwrap_or(m.role()))
            .collect();
        self.ensure_change_allowed(&before, &after)?;

        let mut events = Vec::new();
        for member in &mut self.members {
            if let Some(role) = targets.get(&member.id()) {
                events.extend(member.change_role(*role).map(DomainEvent::from));
            }
        }
        events.extend(self.refresh());
        Ok(events)
    }

    /// Attaches a registration to the team with the given role
    ///
    /// Accepts an individual registration of the same event, or a fresh
    /// registration created for this team.
    pub fn add_member(
        &mut self,
        mut registration: RegistrationRecord,
        role: Role,
    ) -> Result<Vec<DomainEvent>, RegistrationError> {
        if !role.is_team_role() {
            return Err(RegistrationError::validation(
                "Team members need a team role",
            ));
        }
        if registration.event_id() != self.team.event_id() {
            return Err(RegistrationError::validation(format!(
                "Registration {} is for another event",
                registration.id()
            )));
        }
        if self.member(registration.id()).is_some() {
            return Err(RegistrationError::validation(format!(
                "Registration {} is already a member of team {}",
                registration.id(),
                self.team.id()
            )));
        }
        match registration.team_id() {
            None => {}
            Some(id) if id == self.team.id() => {}
            Some(other) => {
                return Err(RegistrationError::validation(format!(
                    "Registration {} belongs to team {}",
                    registration.id(),
                    other
                )))
            }
        }
        if self.contains_sportsperson(registration.sportsperson_id()) {
            return Err(RegistrationError::CapacityViolation(vec![
                Violation::DuplicateSportsperson {
                    sportsperson_id: registration.sportsperson_id(),
                },
            ]));
        }

        let before = self.role_counts();
        let mut after = before.clone();
        after.add(role);
        self.ensure_change_allowed(&before, &after)?;

        let mut events: Vec<DomainEvent> = Vec::new();
        if registration.team_id().is_none() {
            let joined = registration.join_team(
                self.team.id(),
                role,
                self.team.discipline().clone(),
            )?;
            events.extend(joined.into_iter().map(DomainEvent::from));
        } else {
            events.extend(registration.change_role(role).map(DomainEvent::from));
        }

        self.team.push_member(registration.id());
        events.push(
            TeamEvent::MemberAdded {
                team_id: self.team.id(),
                registration_id: registration.id(),
                role,
            }
            .into(),
        );
        self.members.push(registration);
        events.extend(self.refresh());
        Ok(events)
    }

    /// Detaches a member, returning its registration for deletion
    ///
    /// Removal is always allowed; the team may become incomplete or empty.
    pub fn remove_member(
        &mut self,
        registration_id: Uuid,
    ) -> Result<(RegistrationRecord, Vec<DomainEvent>), RegistrationError> {
        let position = self
            .members
            .iter()
            .position(|m| m.id() == registration_id)
            .ok_or_else(|| {
                RegistrationError::validation(format!(
                    "Registration {} is not a member of team {}",
                    registration_id,
                    self.team.id()
                ))
            })?;

        let removed = self.members.remove(position);
        self.team.remove_member(registration_id);

        let mut events: Vec<DomainEvent> = vec![
            TeamEvent::MemberRemoved {
                team_id: self.team.id(),
                registration_id,
            }
            .into(),
            removed.deleted_event().into(),
        ];
        if !self.is_empty() {
            events.extend(self.refresh());
        }
        Ok((removed, events))
    }

    /// Hands out dragon-boat roles in roster order
    ///
    /// The captain keeps the role. Of the others, the first becomes
    /// coxswain and the second drummer as long as enough members remain to
    /// meet the paddler minimum; the rest paddle up to the paddler cap and
    /// then sit in reserve.
    pub fn auto_assign_roles(&mut self) -> Result<Vec<DomainEvent>, RegistrationError> {
        let boat_class = self.team.boat_class().clone();
        if !boat_class.is_dragon_boat() {
            return Err(RegistrationError::validation(format!(
                "Automatic role assignment is only available for dragon boats, not {}",
                boat_class
            )));
        }

        let paddler_limit = RosterCapacityPolicy::limit_for(&boat_class, Role::Paddler);
        let captain = self
            .members
            .iter()
            .find(|m| m.role() == Role::Captain)
            .map(RegistrationRecord::id);

        let others: Vec<Uuid> = self
            .members
            .iter()
            .map(RegistrationRecord::id)
            .filter(|id| Some(*id) != captain)
            .collect();

        let mut targets: HashMap<Uuid, Role> = HashMap::with_capacity(others.len());
        let mut paddling = 0;
        for (index, id) in others.iter().enumerate() {
            let remaining = others.len() - index;
            let role = match index {
                0 if remaining > paddler_limit.min => Role::Coxswain,
                1 if remaining > paddler_limit.min => Role::Drummer,
                _ if paddling < paddler_limit.max => {
                    paddling += 1;
                    Role::Paddler
                }
                _ => Role::Reserve,
            };
            targets.insert(*id, role);
        }

        let after: RoleCounts = self
            .members
            .iter()
            .map(|m| targets.get(&m.id()).copied().unwrap_or(m.role()))
            .collect();
        let blocking = RosterCapacityPolicy::validate_roster(&boat_class, &after).blocking();
        if !blocking.is_empty() {
            return Err(RegistrationError::CapacityViolation(blocking));
        }

        let mut events = Vec::new();
        for member in &mut self.members {
            if let Some(role) = targets.get(&member.id()) {
                events.extend(member.change_role(*role).map(DomainEvent::from));
            }
        }
        events.extend(self.refresh());
        Ok(events)
    }

    // ===== Merge =====

    /// Everything that prevents merging `others` into this roster
    pub fn merge_violations(&self, others: &[Roster]) -> Vec<Violation> {
        let mut violations = Vec::new();

        for other in others {
            let team_id = other.team_id();
            if other.team.event_id() != self.team.event_id() {
                violations.push(Violation::EventMismatch { team_id });
            }
            if other.team.boat_class() != self.team.boat_class() {
                violations.push(Violation::BoatClassMismatch { team_id });
            }
            if other.team.discipline().sex() != self.team.discipline().sex() {
                violations.push(Violation::SexMismatch { team_id });
            }
        }

        let combined: Vec<&RegistrationRecord> = self
            .members
            .iter()
            .chain(others.iter().flat_map(|o| o.members.iter()))
            .collect();

        let mut seen = HashSet::new();
        let mut duplicates = BTreeSet::new();
        for member in &combined {
            if !seen.insert(member.sportsperson_id()) {
                duplicates.insert(member.sportsperson_id());
            }
        }
        violations.extend(
            duplicates
                .into_iter()
                .map(|sportsperson_id| Violation::DuplicateSportsperson { sportsperson_id }),
        );

        let counts: RoleCounts = combined.iter().map(|m| m.role()).collect();
        violations.extend(
            RosterCapacityPolicy::validate_roster(self.team.boat_class(), &counts).blocking(),
        );

        violations
    }

    /// Moves every member of `others` into this roster
    ///
    /// The absorbed registrations take over this team's discipline. Returns
    /// the ids of the emptied teams alongside the events.
    pub fn absorb(
        &mut self,
        others: Vec<Roster>,
    ) -> Result<(Vec<Uuid>, Vec<DomainEvent>), RegistrationError> {
        let violations = self.merge_violations(&others);
        if !violations.is_empty() {
            return Err(RegistrationError::CapacityViolation(violations));
        }

        let discipline = self.team.discipline().clone();
        let mut absorbed = Vec::with_capacity(others.len());
        let mut events: Vec<DomainEvent> = Vec::new();

        for other in others {
            let (team, members) = other.into_parts();
            absorbed.push(team.id());
            for mut member in members {
                events.extend(
                    member
                        .move_to_team(self.team.id(), discipline.clone())
                        .into_iter()
                        .map(DomainEvent::from),
                );
                self.team.push_member(member.id());
                self.members.push(member);
            }
            events.push(TeamEvent::Deleted { team_id: team.id() }.into());
        }

        events.push(
            TeamEvent::Merged {
                team_id: self.team.id(),
                absorbed: absorbed.clone(),
            }
            .into(),
        );
        events.extend(self.refresh());
        Ok((absorbed, events))
    }

    // ===== Status =====

    /// Applies an operator status change to one member
    pub fn transition_member(
        &mut self,
        registration_id: Uuid,
        target: RegistrationStatus,
    ) -> Result<Vec<DomainEvent>, RegistrationError> {
        let member = self.member_mut(registration_id)?;
        let mut events: Vec<DomainEvent> = vec![member.transition(target)?.into()];
        events.extend(self.refresh());
        Ok(events)
    }

    /// Confirms every member of a complete team
    ///
    /// Returns how many members actually changed status.
    pub fn confirm_all(&mut self) -> Result<(usize, Vec<DomainEvent>), RegistrationError> {
        self.ensure_complete()?;

        let mut events: Vec<DomainEvent> = Vec::new();
        for member in &mut self.members {
            if let Some(event) = member.confirm_with_team() {
                events.push(event.into());
            }
        }
        let confirmed = events.len();
        events.extend(self.refresh());
        Ok((confirmed, events))
    }

    /// Marks every member of a complete team as paid
    pub fn mark_all_paid(
        &mut self,
        actor: ActorRole,
    ) -> Result<(usize, Vec<DomainEvent>), RegistrationError> {
        self.ensure_complete()?;

        let mut events: Vec<DomainEvent> = Vec::new();
        for member in &mut self.members {
            if let Some(event) = member.set_paid(true, actor)? {
                events.push(event.into());
            }
        }
        Ok((events.len(), events))
    }

    /// Edits a member's registration in place and recomputes derived state
    pub fn update_member<F>(
        &mut self,
        registration_id: Uuid,
        edit: F,
    ) -> Result<Vec<DomainEvent>, RegistrationError>
    where
        F: FnOnce(&mut RegistrationRecord) -> Result<Vec<DomainEvent>, RegistrationError>,
    {
        let mut draft = self.member_mut(registration_id)?.clone();
        let mut events = edit(&mut draft)?;
        if let Some(slot) = self.members.iter_mut().find(|m| m.id() == registration_id) {
            *slot = draft;
        }
        events.extend(self.refresh());
        Ok(events)
    }

    /// Recomputes completeness, couples member statuses and the team status
    pub fn refresh(&mut self) -> Vec<DomainEvent> {
        let complete = self.computed_completeness();
        let mut events: Vec<DomainEvent> = Vec::new();

        for member in &mut self.members {
            if let Some(event) = member.sync_with_team(complete) {
                events.push(event.into());
            }
        }

        let status = TeamStatus::derive(complete, self.members.iter().map(|m| m.status()));
        if let Some(event) = self.team.apply_derived(complete, status) {
            events.push(event.into());
        }
        events
    }

    /// Team-level access for renames and city edits
    pub fn team_mut(&mut self) -> &mut Team {
        &mut self.team
    }

    fn member_mut(
        &mut self,
        registration_id: Uuid,
    ) -> Result<&mut RegistrationRecord, RegistrationError> {
        let team_id = self.team.id();
        self.members
            .iter_mut()
            .find(|m| m.id() == registration_id)
            .ok_or_else(|| {
                RegistrationError::validation(format!(
                    "Registration {} is not a member of team {}",
                    registration_id, team_id
                ))
            })
    }

    fn ensure_complete(&self) -> Result<(), RegistrationError> {
        if self.computed_completeness() {
            Ok(())
        } else {
            Err(RegistrationError::TeamIncomplete(self.team.id()))
        }
    }

    fn ensure_change_allowed(
        &self,
        before: &RoleCounts,
        after: &RoleCounts,
    ) -> Result<(), RegistrationError> {
        let violations =
            RosterCapacityPolicy::validate_change(self.team.boat_class(), before, after);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(RegistrationError::CapacityViolation(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discipline::{BoatClass, Discipline, Distance, SexCategory};
    use rust_decimal::Decimal;

    fn discipline(boat_class: BoatClass) -> Discipline {
        Discipline::new(boat_class, SexCategory::Mixed, [Distance::meters(200)]).unwrap()
    }

    fn roster(boat_class: BoatClass, roles: &[Role]) -> Roster {
        let event_id = Uuid::new_v4();
        let (team, _) =
            Team::new(event_id, "Crew".to_string(), None, discipline(boat_class)).unwrap();
        let mut roster = Roster::new(team);
        for role in roles {
            let registration = member_for(&roster, *role);
            roster.add_member(registration, *role).unwrap();
        }
        roster
    }

    fn member_for(roster: &Roster, role: Role) -> RegistrationRecord {
        RegistrationRecord::new_team_member(
            Uuid::new_v4(),
            roster.team().event_id(),
            roster.team_id(),
            role,
            roster.team().discipline().clone(),
            Decimal::ZERO,
        )
        .unwrap()
        .0
    }

    fn individual_for(roster: &Roster) -> RegistrationRecord {
        RegistrationRecord::new_individual(
            Uuid::new_v4(),
            roster.team().event_id(),
            discipline(BoatClass::K1),
            Decimal::ZERO,
        )
        .unwrap()
        .0
    }

    fn id_at(roster: &Roster, index: usize) -> Uuid {
        roster.members()[index].id()
    }

    #[test]
    fn paddler_promoted_to_captain_completes_dragon_team() {
        let mut roster = roster(BoatClass::D10, &[Role::Paddler, Role::Paddler]);
        assert!(!roster.team().is_complete());

        let p1 = id_at(&roster, 0);
        roster.assign_role(p1, Role::Captain).unwrap();

        assert_eq!(roster.member(p1).unwrap().role(), Role::Captain);
        assert_eq!(roster.role_counts().get(Role::Paddler), 1);
        assert!(roster.team().is_complete());
    }

    #[test]
    fn last_paddler_cannot_become_captain() {
        let mut roster = roster(BoatClass::D10, &[Role::Paddler]);
        let p1 = id_at(&roster, 0);
        let before = roster.clone();

        let result = roster.assign_role(p1, Role::Captain);

        assert!(matches!(
            result,
            Err(RegistrationError::CapacityViolation(ref v))
                if v == &vec![Violation::MissingRequiredRole { role: Role::Paddler }]
        ));
        assert_eq!(roster, before);
    }

    #[test]
    fn second_captain_rejected() {
        let mut roster = roster(BoatClass::D10, &[Role::Captain, Role::Paddler, Role::Paddler]);
        let p2 = id_at(&roster, 2);

        let result = roster.assign_role(p2, Role::Captain);
        assert!(matches!(
            result,
            Err(RegistrationError::CapacityViolation(ref v))
                if v.contains(&Violation::RoleOverLimit { role: Role::Captain })
        ));
    }

    #[test]
    fn batch_swap_is_validated_as_a_whole() {
        let mut roster = roster(BoatClass::D10, &[Role::Captain, Role::Paddler, Role::Paddler]);
        let captain = id_at(&roster, 0);
        let paddler = id_at(&roster, 1);

        // Either change alone would leave two captains or none
        roster
            .apply_batch(&[
                RoleChange::new(paddler, Role::Captain),
                RoleChange::new(captain, Role::Paddler),
            ])
            .unwrap();

        assert_eq!(roster.member(paddler).unwrap().role(), Role::Captain);
        assert_eq!(roster.member(captain).unwrap().role(), Role::Paddler);
        assert!(roster.team().is_complete());
    }

    #[test]
    fn failing_batch_changes_nothing() {
        let mut roster = roster(BoatClass::D10, &[Role::Captain, Role::Paddler, Role::Paddler]);
        let before = roster.clone();

        let result = roster.apply_batch(&[
            RoleChange::new(id_at(&roster, 1), Role::Drummer),
            RoleChange::new(id_at(&roster, 2), Role::Drummer),
        ]);

        assert!(matches!(result, Err(RegistrationError::CapacityViolation(_))));
        assert_eq!(roster, before);
    }

    #[test]
    fn batch_rejects_duplicates_and_strangers() {
        let mut roster = roster(BoatClass::D10, &[Role::Captain, Role::Paddler]);
        let p = id_at(&roster, 1);

        assert!(roster
            .apply_batch(&[RoleChange::new(p, Role::Reserve), RoleChange::new(p, Role::Drummer)])
            .is_err());
        assert!(roster
            .apply_batch(&[RoleChange::new(Uuid::new_v4(), Role::Reserve)])
            .is_err());
        assert!(roster.apply_batch(&[RoleChange::new(p, Role::None)]).is_err());
    }

    #[test]
    fn single_seat_rejects_second_member() {
        let mut roster = roster(BoatClass::K1, &[Role::Paddler]);
        let before = roster.clone();
        let extra = member_for(&roster, Role::Paddler);

        let result = roster.add_member(extra, Role::Paddler);

        match result {
            Err(RegistrationError::CapacityViolation(violations)) => {
                assert!(violations.contains(&Violation::CapacityExceeded))
            }
            other => panic!("expected capacity violation, got {other:?}"),
        }
        assert_eq!(roster, before);
    }

    #[test]
    fn kayak_rejects_non_paddler_roles() {
        let mut roster = roster(BoatClass::K2, &[Role::Paddler]);
        let extra = member_for(&roster, Role::Captain);

        assert!(roster.add_member(extra, Role::Captain).is_err());
    }

    #[test]
    fn individual_registration_joins_with_team_discipline() {
        let mut roster = roster(BoatClass::D10, &[Role::Captain]);
        let individual = individual_for(&roster);
        let id = individual.id();

        roster.add_member(individual, Role::Paddler).unwrap();

        let member = roster.member(id).unwrap();
        assert_eq!(member.team_id(), Some(roster.team_id()));
        assert_eq!(member.discipline(), roster.team().discipline());
        assert_eq!(roster.team().members().last(), Some(&id));
    }

    #[test]
    fn same_sportsperson_cannot_join_twice() {
        let mut roster = roster(BoatClass::D10, &[Role::Captain]);
        let existing = roster.members()[0].sportsperson_id();
        let (duplicate, _) = RegistrationRecord::new_team_member(
            existing,
            roster.team().event_id(),
            roster.team_id(),
            Role::Paddler,
            roster.team().discipline().clone(),
            Decimal::ZERO,
        )
        .unwrap();

        let result = roster.add_member(duplicate, Role::Paddler);
        assert!(matches!(
            result,
            Err(RegistrationError::CapacityViolation(ref v))
                if v == &vec![Violation::DuplicateSportsperson { sportsperson_id: existing }]
        ));
    }

    #[test]
    fn incomplete_team_members_wait_for_team() {
        let roster = roster(BoatClass::D10, &[Role::Paddler, Role::Paddler]);

        assert!(roster
            .members()
            .iter()
            .all(|m| m.status() == RegistrationStatus::WaitingForTeam));
        assert_eq!(roster.team().aggregate_status(), TeamStatus::WaitingForTeam);
    }

    #[test]
    fn completing_team_releases_waiting_members() {
        let mut roster = roster(BoatClass::D10, &[Role::Paddler]);
        let captain = member_for(&roster, Role::Captain);
        roster.add_member(captain, Role::Captain).unwrap();

        assert!(roster.team().is_complete());
        assert!(roster
            .members()
            .iter()
            .all(|m| m.status() == RegistrationStatus::Queued));
    }

    #[test]
    fn removing_member_makes_team_incomplete() {
        let mut roster = roster(BoatClass::K2, &[Role::Paddler, Role::Paddler]);
        assert!(roster.team().is_complete());

        let id = id_at(&roster, 1);
        let (removed, events) = roster.remove_member(id).unwrap();

        assert_eq!(removed.id(), id);
        assert!(!roster.team().is_complete());
        assert_eq!(roster.team().members().len(), 1);
        assert!(events.contains(&DomainEvent::Registration(removed.deleted_event())));
    }

    #[test]
    fn removing_last_member_leaves_empty_roster() {
        let mut roster = roster(BoatClass::K1, &[Role::Paddler]);
        let id = id_at(&roster, 0);

        roster.remove_member(id).unwrap();
        assert!(roster.is_empty());
        assert!(roster.remove_member(id).is_err());
    }

    #[test]
    fn auto_assign_fills_dragon_roles_in_order() {
        let mut roles = vec![Role::Captain];
        roles.extend(std::iter::repeat(Role::Paddler).take(9));
        roles.extend([Role::Reserve, Role::Reserve, Role::Coxswain, Role::Drummer]);
        let mut roster = roster(BoatClass::D10, &roles);
        assert_eq!(roster.members().len(), 14);

        roster.auto_assign_roles().unwrap();

        let counts = roster.role_counts();
        assert_eq!(roster.members()[0].role(), Role::Captain);
        assert_eq!(roster.members()[1].role(), Role::Coxswain);
        assert_eq!(roster.members()[2].role(), Role::Drummer);
        assert_eq!(roster.members()[13].role(), Role::Reserve);
        assert_eq!(counts.get(Role::Paddler), 9);
        assert_eq!(counts.get(Role::Reserve), 2);
        assert!(roster.team().is_complete());
    }

    #[test]
    fn auto_assign_keeps_a_paddler_in_small_crews() {
        let mut roster = roster(BoatClass::D10, &[Role::Captain, Role::Paddler, Role::Paddler]);

        roster.auto_assign_roles().unwrap();

        assert_eq!(roster.members()[1].role(), Role::Coxswain);
        assert_eq!(roster.members()[2].role(), Role::Paddler);
        assert!(roster.team().is_complete());
    }

    #[test]
    fn auto_assign_only_for_dragon_boats() {
        let mut roster = roster(BoatClass::K4, &[Role::Paddler]);
        assert!(matches!(
            roster.auto_assign_roles(),
            Err(RegistrationError::Validation(_))
        ));
    }

    #[test]
    fn merge_of_full_pairs_exceeds_capacity() {
        let mut primary = roster(BoatClass::K2, &[Role::Paddler, Role::Paddler]);
        let (team, _) = Team::new(
            primary.team().event_id(),
            "Other".to_string(),
            None,
            primary.team().discipline().clone(),
        )
        .unwrap();
        let mut secondary = Roster::new(team);
        for _ in 0..2 {
            let extra = member_for(&secondary, Role::Paddler);
            secondary.add_member(extra, Role::Paddler).unwrap();
        }
        let before = primary.clone();

        let result = primary.absorb(vec![secondary]);

        match result {
            Err(RegistrationError::CapacityViolation(violations)) => {
                assert!(violations.contains(&Violation::CapacityExceeded));
            }
            other => panic!("expected capacity violation, got {other:?}"),
        }
        assert_eq!(primary, before);
    }

    #[test]
    fn merge_moves_members_under_primary_discipline() {
        let mut primary = roster(BoatClass::D10, &[Role::Captain, Role::Paddler]);
        let distances = [Distance::meters(500)];
        let other_discipline =
            Discipline::new(BoatClass::D10, SexCategory::Mixed, distances).unwrap();
        let (team, _) = Team::new(
            primary.team().event_id(),
            "Second crew".to_string(),
            None,
            other_discipline,
        )
        .unwrap();
        let mut secondary = Roster::new(team);
        for role in [Role::Paddler, Role::Reserve] {
            let extra = member_for(&secondary, role);
            secondary.add_member(extra, role).unwrap();
        }
        let secondary_id = secondary.team_id();

        let (absorbed, events) = primary.absorb(vec![secondary]).unwrap();

        assert_eq!(absorbed, vec![secondary_id]);
        assert_eq!(primary.members().len(), 4);
        assert!(primary
            .members()
            .iter()
            .all(|m| m.team_id() == Some(primary.team_id())
                && m.discipline() == primary.team().discipline()));
        assert!(events.contains(&DomainEvent::Team(TeamEvent::Deleted {
            team_id: secondary_id
        })));
    }

    #[test]
    fn merge_reports_every_incompatibility() {
        let primary = roster(BoatClass::D10, &[Role::Captain]);
        let other_class = roster(BoatClass::K4, &[Role::Paddler]);

        let violations = primary.merge_violations(std::slice::from_ref(&other_class));

        let team_id = other_class.team_id();
        assert!(violations.contains(&Violation::EventMismatch { team_id }));
        assert!(violations.contains(&Violation::BoatClassMismatch { team_id }));
    }

    #[test]
    fn confirm_all_requires_complete_team() {
        let mut roster = roster(BoatClass::D10, &[Role::Paddler]);
        assert!(matches!(
            roster.confirm_all(),
            Err(RegistrationError::TeamIncomplete(_))
        ));
    }

    #[test]
    fn confirm_all_is_idempotent() {
        let mut roster = roster(BoatClass::K2, &[Role::Paddler, Role::Paddler]);

        let (first, _) = roster.confirm_all().unwrap();
        let (second, events) = roster.confirm_all().unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 0);
        assert!(events.is_empty());
        assert_eq!(roster.team().aggregate_status(), TeamStatus::Confirmed);
    }

    #[test]
    fn mark_all_paid_counts_changes() {
        let mut roster = roster(BoatClass::K2, &[Role::Paddler, Role::Paddler]);
        let first = id_at(&roster, 0);
        roster
            .update_member(first, |m| {
                Ok(m.set_paid(true, ActorRole::Organizer)?
                    .into_iter()
                    .map(DomainEvent::from)
                    .collect())
            })
            .unwrap();

        let (paid, _) = roster.mark_all_paid(ActorRole::Organizer).unwrap();
        assert_eq!(paid, 1);
        assert!(roster.members().iter().all(RegistrationRecord::paid));
    }

    #[test]
    fn from_parts_restores_stored_order() {
        let original = roster(BoatClass::D10, &[Role::Captain, Role::Paddler, Role::Drummer]);
        let (team, mut members) = original.clone().into_parts();
        members.reverse();

        let restored = Roster::from_parts(team, members).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn from_parts_rejects_foreign_registration() {
        let original = roster(BoatClass::D10, &[Role::Captain]);
        let (team, mut members) = original.into_parts();
        let stranger = RegistrationRecord::new_individual(
            Uuid::new_v4(),
            team.event_id(),
            team.discipline().clone(),
            Decimal::ZERO,
        )
        .unwrap()
        .0;
        members.push(stranger);

        assert!(Roster::from_parts(team, members).is_err());
    }
}
