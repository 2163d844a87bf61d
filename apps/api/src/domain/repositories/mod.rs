// Repository ports (persistence interfaces)
// Implemented by adapters in the infrastructure layer

pub mod event_directory;
pub mod registration_store;

pub use event_directory::EventDirectory;
pub use registration_store::{check_roster_guard, ChangeSet, RegistrationStore, StoreError};
