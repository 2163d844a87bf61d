// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod actor;
pub mod discipline;
pub mod errors;
pub mod event;
pub mod events;
pub mod policy;
pub mod registration;
pub mod repositories;
pub mod sportsperson;
pub mod team;
