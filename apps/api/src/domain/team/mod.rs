// Team domain module
// Contains the team aggregate root, its roster, value objects, and domain events

#![allow(clippy::module_inception)]

pub mod events;
pub mod roster;
pub mod team;
pub mod value_objects;

// Re-export main types for convenience
pub use roster::{RoleChange, Roster};
pub use team::Team;
pub use value_objects::TeamStatus;
