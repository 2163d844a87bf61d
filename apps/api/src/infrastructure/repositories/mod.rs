// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod in_memory_store;
pub mod postgres_event_directory;
pub mod postgres_registration_store;

pub use in_memory_store::InMemoryStore;
pub use postgres_event_directory::PostgresEventDirectory;
pub use postgres_registration_store::PostgresRegistrationStore;

use crate::domain::repositories::StoreError;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}
