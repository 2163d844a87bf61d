//! Roster capacity rules per boat class
//!
//! Pure functions only. Validation never fails; it reports reason codes and
//! leaves it to the caller to decide whether they block an operation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::discipline::BoatClass;
use super::registration::value_objects::Role;

/// Reason a roster (or a merge of rosters) breaks the rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Violation {
    RoleOverLimit { role: Role },
    MissingRequiredRole { role: Role },
    CapacityExceeded,
    EventMismatch { team_id: Uuid },
    BoatClassMismatch { team_id: Uuid },
    SexMismatch { team_id: Uuid },
    DuplicateSportsperson { sportsperson_id: Uuid },
    /// Team member list disagrees with the registrations pointing at it
    RosterOutOfSync { team_id: Uuid },
}

impl Violation {
    /// Missing roles only make a team incomplete; everything else blocks a change
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Violation::MissingRequiredRole { .. })
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::RoleOverLimit { role } => write!(f, "ROLE_OVER_LIMIT({role})"),
            Violation::MissingRequiredRole { role } => write!(f, "MISSING_REQUIRED_ROLE({role})"),
            Violation::CapacityExceeded => write!(f, "CAPACITY_EXCEEDED"),
            Violation::EventMismatch { team_id } => write!(f, "EVENT_MISMATCH({team_id})"),
            Violation::BoatClassMismatch { team_id } => write!(f, "BOAT_CLASS_MISMATCH({team_id})"),
            Violation::SexMismatch { team_id } => write!(f, "SEX_MISMATCH({team_id})"),
            Violation::DuplicateSportsperson { sportsperson_id } => {
                write!(f, "DUPLICATE_SPORTSPERSON({sportsperson_id})")
            }
            Violation::RosterOutOfSync { team_id } => write!(f, "ROSTER_OUT_OF_SYNC({team_id})"),
        }
    }
}

/// Inclusive cardinality bounds for one role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLimit {
    pub min: usize,
    pub max: usize,
}

impl RoleLimit {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

/// Number of roster members per role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts(BTreeMap<Role, usize>);

impl RoleCounts {
    pub fn get(&self, role: Role) -> usize {
        self.0.get(&role).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn add(&mut self, role: Role) {
        *self.0.entry(role).or_insert(0) += 1;
    }
}

impl FromIterator<Role> for RoleCounts {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut counts = RoleCounts::default();
        for role in iter {
            counts.add(role);
        }
        counts
    }
}

/// Outcome of validating a roster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    /// Violations that forbid committing a roster
    pub fn blocking(&self) -> Vec<Violation> {
        self.violations
            .iter()
            .filter(|v| v.is_blocking())
            .cloned()
            .collect()
    }
}

/// Capacity and role-cardinality rules
pub struct RosterCapacityPolicy;

impl RosterCapacityPolicy {
    /// Maximum number of people in a boat of this class
    pub fn capacity_for(boat_class: &BoatClass) -> usize {
        match boat_class {
            BoatClass::K1 | BoatClass::C1 => 1,
            BoatClass::K2 | BoatClass::C2 => 2,
            BoatClass::K4 | BoatClass::C4 => 4,
            BoatClass::D10 => 14,
            BoatClass::Other(_) => 1,
        }
    }

    /// Allowed roles with their bounds; roles not listed have a maximum of zero
    pub fn role_limits(boat_class: &BoatClass) -> BTreeMap<Role, RoleLimit> {
        if boat_class.is_dragon_boat() {
            return BTreeMap::from([
                (Role::Captain, RoleLimit::new(1, 1)),
                (Role::Coxswain, RoleLimit::new(0, 1)),
                (Role::Drummer, RoleLimit::new(0, 1)),
                (Role::Paddler, RoleLimit::new(1, 9)),
                (Role::Reserve, RoleLimit::new(0, 2)),
            ]);
        }

        // Fixed-seat boats race with every seat filled
        let seats = Self::capacity_for(boat_class);
        BTreeMap::from([(Role::Paddler, RoleLimit::new(seats, seats))])
    }

    pub fn limit_for(boat_class: &BoatClass, role: Role) -> RoleLimit {
        Self::role_limits(boat_class)
            .get(&role)
            .copied()
            .unwrap_or(RoleLimit::new(0, 0))
    }

    /// Checks every role count and the total against the class rules
    pub fn validate_roster(boat_class: &BoatClass, counts: &RoleCounts) -> ValidationResult {
        let limits = Self::role_limits(boat_class);
        let mut violations = Vec::new();

        for role in Role::TEAM_ROLES.into_iter().chain([Role::None]) {
            let limit = limits.get(&role).copied().unwrap_or(RoleLimit::new(0, 0));
            let count = counts.get(role);
            if count > limit.max {
                violations.push(Violation::RoleOverLimit { role });
            } else if count < limit.min {
                violations.push(Violation::MissingRequiredRole { role });
            }
        }

        if counts.total() > Self::capacity_for(boat_class) {
            violations.push(Violation::CapacityExceeded);
        }

        ValidationResult { violations }
    }

    /// Violations that forbid moving a roster from `before` to `after`
    ///
    /// Besides blocking violations of the final roster, a change may not
    /// push a role that met its minimum below that minimum.
    pub fn validate_change(
        boat_class: &BoatClass,
        before: &RoleCounts,
        after: &RoleCounts,
    ) -> Vec<Violation> {
        let mut violations = Self::validate_roster(boat_class, after).blocking();

        for (role, limit) in Self::role_limits(boat_class) {
            let had = before.get(role);
            let has = after.get(role);
            if has < had && had >= limit.min && has < limit.min {
                violations.push(Violation::MissingRequiredRole { role });
            }
        }

        violations
    }
}
