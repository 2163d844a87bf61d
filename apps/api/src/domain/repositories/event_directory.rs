use async_trait::async_trait;
use uuid::Uuid;

use super::registration_store::StoreError;
use crate::domain::event::EventInfo;

/// Read access to competitions owned by the events subsystem
#[async_trait]
pub trait EventDirectory: Send + Sync {
    async fn find_event(&self, id: Uuid) -> Result<Option<EventInfo>, StoreError>;

    async fn find_events(&self, ids: &[Uuid]) -> Result<Vec<EventInfo>, StoreError>;
}
