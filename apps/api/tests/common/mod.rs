//! Shared fixtures for the registry integration tests
#![allow(dead_code)]

use std::sync::Arc;

use paddle_registry_api::domain::actor::ActorRole;
use paddle_registry_api::domain::discipline::{
    BoatClass, Discipline, DisciplineCatalog, Distance, SexCategory,
};
use paddle_registry_api::domain::event::{EventInfo, EventStatus};
use paddle_registry_api::domain::registration::{RegistrationRecord, Role};
use paddle_registry_api::domain::sportsperson::SportspersonDraft;
use paddle_registry_api::domain::team::Roster;
use paddle_registry_api::infrastructure::repositories::InMemoryStore;
use paddle_registry_api::services::registrations::{NewRegistration, NewTeam, Registrant};
use paddle_registry_api::services::roster_engine::{AddMember, Entrant};
use paddle_registry_api::services::{RegistrationService, Stores};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Role the fixtures act as
pub const OPERATOR: ActorRole = ActorRole::Organizer;

/// An in-memory registry with one event open for registration
pub struct Registry {
    pub store: Arc<InMemoryStore>,
    pub stores: Stores,
    pub event: EventInfo,
}

impl Registry {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let event = EventInfo {
            id: Uuid::new_v4(),
            name: "Spring Regatta".to_string(),
            status: EventStatus::RegistrationOpen,
            catalog: catalog(),
        };
        store
            .insert_event(event.clone())
            .expect("Failed to insert event");

        Self {
            stores: Stores::new(store.clone(), store.clone()),
            store,
            event,
        }
    }

    /// Moves the event to another lifecycle status
    pub fn set_event_status(&mut self, status: EventStatus) {
        self.event.status = status;
        self.store
            .insert_event(self.event.clone())
            .expect("Failed to update event");
    }

    pub fn service(&self) -> RegistrationService {
        RegistrationService::new(self.stores.clone())
    }

    /// Creates a team whose members are drafts holding `roles`
    pub async fn team(&self, name: &str, discipline: Discipline, roles: &[Role]) -> Roster {
        self.service()
            .create_team(
                NewTeam {
                    event_id: self.event.id,
                    name: name.to_string(),
                    city: Some("Kraków".to_string()),
                    discipline,
                    members: roles
                        .iter()
                        .enumerate()
                        .map(|(i, role)| draft_member(&format!("{name} member {i}"), *role))
                        .collect(),
                },
                OPERATOR,
            )
            .await
            .expect("Failed to create team")
    }

    /// Registers a new sportsperson individually
    pub async fn individual(&self, name: &str, discipline: Discipline) -> RegistrationRecord {
        self.service()
            .create_registration(
                NewRegistration {
                    registrant: Registrant::Draft(SportspersonDraft::new(name)),
                    event_id: self.event.id,
                    discipline,
                    cost: Decimal::new(5000, 2),
                },
                OPERATOR,
            )
            .await
            .expect("Failed to create registration")
    }
}

/// D-10 mixed and women, K-1 men and K-2 men, all over 200 and 500 metres
pub fn catalog() -> DisciplineCatalog {
    let distances = [Distance::meters(200), Distance::meters(500)];
    DisciplineCatalog::new()
        .with_entry(BoatClass::D10, SexCategory::Mixed, distances)
        .with_entry(BoatClass::D10, SexCategory::Women, distances)
        .with_entry(BoatClass::K1, SexCategory::Men, distances)
        .with_entry(BoatClass::K2, SexCategory::Men, distances)
}

pub fn discipline(boat_class: BoatClass, sex: SexCategory) -> Discipline {
    Discipline::new(boat_class, sex, [Distance::meters(200)]).expect("valid discipline")
}

pub fn dragon() -> Discipline {
    discipline(BoatClass::D10, SexCategory::Mixed)
}

pub fn kayak_single() -> Discipline {
    discipline(BoatClass::K1, SexCategory::Men)
}

pub fn kayak_double() -> Discipline {
    discipline(BoatClass::K2, SexCategory::Men)
}

pub fn draft_member(name: &str, role: Role) -> AddMember {
    AddMember {
        entrant: Entrant::Draft(SportspersonDraft::new(name)),
        role,
        cost: None,
    }
}

/// Members of `roster` holding `role`, in roster order
pub fn with_role(roster: &Roster, role: Role) -> Vec<Uuid> {
    roster
        .members()
        .iter()
        .filter(|m| m.role() == role)
        .map(|m| m.id())
        .collect()
}
