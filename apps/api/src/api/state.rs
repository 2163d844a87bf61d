use std::sync::Arc;

use crate::services::{
    QueueView, RegistrationService, RegistrationStatusMachine, Stores, TeamMergeService,
    TeamRosterEngine,
};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: Arc<str>,
    pub registrations: RegistrationService,
    pub roster: TeamRosterEngine,
    pub status: RegistrationStatusMachine,
    pub merge: TeamMergeService,
    pub queue: QueueView,
}

impl AppState {
    pub fn new(stores: Stores, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            registrations: RegistrationService::new(stores.clone()),
            roster: TeamRosterEngine::new(stores.clone()),
            status: RegistrationStatusMachine::new(stores.clone()),
            merge: TeamMergeService::new(stores.clone()),
            queue: QueueView::new(stores),
        }
    }
}
