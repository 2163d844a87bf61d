// Registration domain module
// Contains the registration aggregate, its value objects, and domain events

#![allow(clippy::module_inception)]

pub mod events;
pub mod registration;
pub mod value_objects;

pub use registration::RegistrationRecord;
pub use value_objects::{RegistrationStatus, Role};
