//! Roster operations against the in-memory store
//!
//! Covers role assignment, batch atomicity, membership changes,
//! registration-window gating and stale roster writes.

mod common;

use common::{draft_member, dragon, kayak_double, kayak_single, with_role, Registry, OPERATOR};
use paddle_registry_api::domain::errors::RegistrationError;
use paddle_registry_api::domain::event::EventStatus;
use paddle_registry_api::domain::policy::Violation;
use paddle_registry_api::domain::registration::{RegistrationStatus, Role};
use paddle_registry_api::domain::repositories::{ChangeSet, RegistrationStore, StoreError};
use paddle_registry_api::domain::team::{RoleChange, Roster, TeamStatus};
use paddle_registry_api::services::roster_engine::{AddMember, Entrant};
use paddle_registry_api::services::{RegistrationStatusMachine, TeamRosterEngine};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Reads a roster straight from the store, as a service would before mutating it
async fn load_roster(registry: &Registry, team_id: Uuid) -> Roster {
    let team = registry.store.find_team(team_id).await.unwrap().unwrap();
    let members = registry.store.registrations_for_team(team_id).await.unwrap();
    Roster::from_parts(team, members).unwrap()
}

fn sportsperson_entrant(sportsperson_id: Uuid) -> AddMember {
    AddMember {
        entrant: Entrant::Sportsperson { sportsperson_id },
        role: Role::Paddler,
        cost: None,
    }
}

#[tokio::test]
async fn promoting_a_paddler_to_captain_completes_the_team() {
    let registry = Registry::new();
    let roster = registry
        .team("Dragons", dragon(), &[Role::Paddler, Role::Paddler])
        .await;
    assert!(!roster.team().is_complete());
    assert!(roster
        .members()
        .iter()
        .all(|m| m.status() == RegistrationStatus::WaitingForTeam));

    let p1 = roster.members()[0].id();
    let engine = TeamRosterEngine::new(registry.stores.clone());
    let roster = engine
        .assign_role(roster.team_id(), p1, Role::Captain, OPERATOR)
        .await
        .expect("assign captain");

    assert_eq!(with_role(&roster, Role::Captain), vec![p1]);
    assert_eq!(with_role(&roster, Role::Paddler).len(), 1);
    assert!(roster.team().is_complete());
    assert!(roster
        .members()
        .iter()
        .all(|m| m.status() == RegistrationStatus::Queued));

    let stored = registry
        .store
        .find_team(roster.team_id())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_complete());
}

#[tokio::test]
async fn full_single_seat_boat_rejects_another_member() {
    let registry = Registry::new();
    let roster = registry.team("Solo", kayak_single(), &[Role::Paddler]).await;
    let engine = TeamRosterEngine::new(registry.stores.clone());

    let result = engine
        .add_member(
            roster.team_id(),
            draft_member("Late Entry", Role::Paddler),
            OPERATOR,
        )
        .await;

    match result {
        Err(RegistrationError::CapacityViolation(violations)) => {
            assert!(violations.contains(&Violation::CapacityExceeded));
        }
        other => panic!("expected capacity violation, got {:?}", other),
    }

    let members = registry
        .store
        .registrations_for_team(roster.team_id())
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn batch_swaps_roles_that_fail_one_at_a_time() {
    let registry = Registry::new();
    let roster = registry
        .team(
            "Swappers",
            dragon(),
            &[Role::Captain, Role::Coxswain, Role::Paddler],
        )
        .await;
    let captain = with_role(&roster, Role::Captain)[0];
    let coxswain = with_role(&roster, Role::Coxswain)[0];
    let engine = TeamRosterEngine::new(registry.stores.clone());

    // A lone move would leave two coxswains and no captain
    assert!(engine
        .assign_role(roster.team_id(), captain, Role::Coxswain, OPERATOR)
        .await
        .is_err());

    let roster = engine
        .apply_batch(
            roster.team_id(),
            &[
                RoleChange::new(captain, Role::Coxswain),
                RoleChange::new(coxswain, Role::Captain),
            ],
            OPERATOR,
        )
        .await
        .expect("swap in one batch");

    assert_eq!(with_role(&roster, Role::Captain), vec![coxswain]);
    assert_eq!(with_role(&roster, Role::Coxswain), vec![captain]);
}

#[tokio::test]
async fn failing_batch_changes_nothing() {
    let registry = Registry::new();
    let roster = registry
        .team(
            "Steady",
            dragon(),
            &[Role::Captain, Role::Paddler, Role::Paddler],
        )
        .await;
    let paddlers = with_role(&roster, Role::Paddler);
    let engine = TeamRosterEngine::new(registry.stores.clone());

    let result = engine
        .apply_batch(
            roster.team_id(),
            &[
                RoleChange::new(paddlers[0], Role::Reserve),
                RoleChange::new(paddlers[1], Role::Captain),
            ],
            OPERATOR,
        )
        .await;

    assert!(matches!(result, Err(RegistrationError::CapacityViolation(_))));
    let stored = registry
        .store
        .registrations_for_team(roster.team_id())
        .await
        .unwrap();
    assert_eq!(
        stored.iter().filter(|r| r.role() == Role::Paddler).count(),
        2
    );
    assert_eq!(
        stored.iter().filter(|r| r.role() == Role::Captain).count(),
        1
    );
}

#[tokio::test]
async fn assigning_an_individual_registration_attaches_it() {
    let registry = Registry::new();
    let roster = registry.team("Open Seats", dragon(), &[Role::Captain]).await;
    let individual = registry.individual("Walk In", dragon()).await;
    let engine = TeamRosterEngine::new(registry.stores.clone());

    let roster = engine
        .assign_role(roster.team_id(), individual.id(), Role::Paddler, OPERATOR)
        .await
        .expect("attach individual");

    let member = roster.member(individual.id()).expect("member");
    assert_eq!(member.team_id(), Some(roster.team_id()));
    assert_eq!(member.role(), Role::Paddler);
    assert!(roster.team().is_complete());
}

#[tokio::test]
async fn existing_registration_takes_the_given_cost() {
    let registry = Registry::new();
    let roster = registry.team("Priced", kayak_double(), &[Role::Paddler]).await;
    let individual = registry.individual("Second Seat", kayak_double()).await;
    let engine = TeamRosterEngine::new(registry.stores.clone());

    let roster = engine
        .add_member(
            roster.team_id(),
            AddMember {
                entrant: Entrant::Registration {
                    registration_id: individual.id(),
                },
                role: Role::Paddler,
                cost: Some(Decimal::new(12000, 2)),
            },
            OPERATOR,
        )
        .await
        .expect("add registration");

    assert_eq!(
        roster.member(individual.id()).unwrap().cost(),
        Decimal::new(12000, 2)
    );
    assert!(roster.team().is_complete());
}

#[tokio::test]
async fn auto_assign_fills_helm_and_drum_first() {
    let registry = Registry::new();
    let roster = registry
        .team(
            "Auto",
            dragon(),
            &[
                Role::Captain,
                Role::Paddler,
                Role::Paddler,
                Role::Paddler,
                Role::Paddler,
                Role::Paddler,
            ],
        )
        .await;
    let engine = TeamRosterEngine::new(registry.stores.clone());

    let roster = engine
        .auto_assign_roles(roster.team_id(), OPERATOR)
        .await
        .expect("auto assign");

    assert_eq!(with_role(&roster, Role::Captain).len(), 1);
    assert_eq!(with_role(&roster, Role::Coxswain).len(), 1);
    assert_eq!(with_role(&roster, Role::Drummer).len(), 1);
    assert_eq!(with_role(&roster, Role::Paddler).len(), 3);
}

#[tokio::test]
async fn auto_assign_is_only_for_dragon_boats() {
    let registry = Registry::new();
    let roster = registry
        .team("Pair", kayak_double(), &[Role::Paddler, Role::Paddler])
        .await;
    let engine = TeamRosterEngine::new(registry.stores.clone());

    assert!(matches!(
        engine.auto_assign_roles(roster.team_id(), OPERATOR).await,
        Err(RegistrationError::Validation(_))
    ));
}

#[tokio::test]
async fn removing_the_last_member_deletes_the_team() {
    let registry = Registry::new();
    let roster = registry.team("Vanishing", kayak_single(), &[Role::Paddler]).await;
    let member = roster.members()[0].id();
    let engine = TeamRosterEngine::new(registry.stores.clone());

    let result = engine
        .remove_member(roster.team_id(), member, OPERATOR)
        .await
        .expect("remove member");

    assert!(result.is_none());
    assert!(registry
        .store
        .find_team(roster.team_id())
        .await
        .unwrap()
        .is_none());
    assert!(registry
        .store
        .find_registration(member)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn removing_a_member_makes_the_team_wait_again() {
    let registry = Registry::new();
    let roster = registry
        .team("Pair", kayak_double(), &[Role::Paddler, Role::Paddler])
        .await;
    assert!(roster.team().is_complete());
    let engine = TeamRosterEngine::new(registry.stores.clone());

    let roster = engine
        .remove_member(roster.team_id(), roster.members()[1].id(), OPERATOR)
        .await
        .expect("remove member")
        .expect("team survives");

    assert!(!roster.team().is_complete());
    assert_eq!(roster.team().aggregate_status(), TeamStatus::WaitingForTeam);
    assert_eq!(
        roster.members()[0].status(),
        RegistrationStatus::WaitingForTeam
    );
}

#[tokio::test]
async fn closed_registration_blocks_roster_changes() {
    let mut registry = Registry::new();
    let roster = registry.team("Late", dragon(), &[Role::Captain]).await;
    registry.set_event_status(EventStatus::RegistrationClosed);
    let engine = TeamRosterEngine::new(registry.stores.clone());

    let result = engine
        .add_member(
            roster.team_id(),
            draft_member("Too Late", Role::Paddler),
            OPERATOR,
        )
        .await;

    assert!(matches!(result, Err(RegistrationError::RegistrationClosed(_))));
}

#[tokio::test]
async fn known_sportsperson_joins_a_team_in_another_boat_class() {
    let registry = Registry::new();
    let pair = registry.team("Pair", kayak_double(), &[Role::Paddler]).await;
    let dragons = registry.team("Dragons", dragon(), &[Role::Captain]).await;
    let sportsperson_id = pair.members()[0].sportsperson_id();
    let engine = TeamRosterEngine::new(registry.stores.clone());

    let roster = engine
        .add_member(
            dragons.team_id(),
            sportsperson_entrant(sportsperson_id),
            OPERATOR,
        )
        .await
        .expect("add sportsperson");

    assert!(roster.contains_sportsperson(sportsperson_id));
    assert!(roster.team().is_complete());
}

#[tokio::test]
async fn sportsperson_cannot_race_one_boat_class_for_two_teams() {
    let registry = Registry::new();
    let first = registry.team("First", kayak_double(), &[Role::Paddler]).await;
    let second = registry.team("Second", kayak_double(), &[Role::Paddler]).await;
    let sportsperson_id = first.members()[0].sportsperson_id();
    let engine = TeamRosterEngine::new(registry.stores.clone());

    let result = engine
        .add_member(
            second.team_id(),
            sportsperson_entrant(sportsperson_id),
            OPERATOR,
        )
        .await;

    assert!(matches!(result, Err(RegistrationError::Validation(_))));
    let members = registry
        .store
        .registrations_for_team(second.team_id())
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn individually_registered_sportsperson_must_join_with_that_registration() {
    let registry = Registry::new();
    let roster = registry.team("Pair", kayak_double(), &[Role::Paddler]).await;
    let individual = registry.individual("Walk In", kayak_double()).await;
    let engine = TeamRosterEngine::new(registry.stores.clone());

    let result = engine
        .add_member(
            roster.team_id(),
            sportsperson_entrant(individual.sportsperson_id()),
            OPERATOR,
        )
        .await;

    assert!(matches!(result, Err(RegistrationError::Validation(_))));
}

#[tokio::test]
async fn stale_roster_keeps_a_concurrent_payment() {
    let registry = Registry::new();
    let roster = registry
        .team(
            "Racers",
            dragon(),
            &[Role::Captain, Role::Paddler, Role::Paddler],
        )
        .await;
    let paddlers = with_role(&roster, Role::Paddler);
    let (paid, moved) = (paddlers[0], paddlers[1]);
    let mut stale = load_roster(&registry, roster.team_id()).await;

    RegistrationStatusMachine::new(registry.stores.clone())
        .set_payment(paid, true, OPERATOR)
        .await
        .expect("pay");

    stale.assign_role(moved, Role::Reserve).unwrap();
    let mut changes = ChangeSet::new();
    changes.save_roster(&stale);
    registry
        .store
        .commit(changes)
        .await
        .expect("unrelated member");

    let stored = load_roster(&registry, roster.team_id()).await;
    assert!(stored.member(paid).unwrap().paid());
    assert_eq!(stored.member(moved).unwrap().role(), Role::Reserve);
}

#[tokio::test]
async fn stale_roster_cannot_overwrite_a_concurrent_edit_of_the_same_member() {
    let registry = Registry::new();
    let roster = registry
        .team(
            "Racers",
            dragon(),
            &[Role::Captain, Role::Paddler, Role::Paddler],
        )
        .await;
    let paddler = with_role(&roster, Role::Paddler)[0];
    let mut stale = load_roster(&registry, roster.team_id()).await;

    RegistrationStatusMachine::new(registry.stores.clone())
        .set_payment(paddler, true, OPERATOR)
        .await
        .expect("pay");

    stale.assign_role(paddler, Role::Reserve).unwrap();
    let mut changes = ChangeSet::new();
    changes.save_roster(&stale);

    assert!(matches!(
        registry.store.commit(changes).await,
        Err(StoreError::StaleWrite { entity: "registration", .. })
    ));
    let stored = registry
        .store
        .find_registration(paddler)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.paid());
    assert_eq!(stored.role(), Role::Paddler);
}

#[tokio::test]
async fn stale_roster_cannot_recreate_a_removed_member() {
    let registry = Registry::new();
    let roster = registry
        .team(
            "Racers",
            dragon(),
            &[Role::Captain, Role::Paddler, Role::Paddler],
        )
        .await;
    let paddlers = with_role(&roster, Role::Paddler);
    let (removed, moved) = (paddlers[0], paddlers[1]);
    let mut stale = load_roster(&registry, roster.team_id()).await;

    TeamRosterEngine::new(registry.stores.clone())
        .remove_member(roster.team_id(), removed, OPERATOR)
        .await
        .expect("remove member")
        .expect("team survives");

    stale.assign_role(moved, Role::Reserve).unwrap();
    let mut changes = ChangeSet::new();
    changes.save_roster(&stale);

    assert!(matches!(
        registry.store.commit(changes).await,
        Err(StoreError::StaleWrite { entity: "team", .. })
    ));
    assert!(registry
        .store
        .find_registration(removed)
        .await
        .unwrap()
        .is_none());
    let stored = load_roster(&registry, roster.team_id()).await;
    assert_eq!(stored.members().len(), 2);
    assert_eq!(stored.member(moved).unwrap().role(), Role::Paddler);
}
