//! Paddle Registry API Library
//!
//! Registration, team roster and registration-status engine for paddling
//! competitions, with PostgreSQL and in-memory persistence adapters and an
//! axum HTTP surface.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;
