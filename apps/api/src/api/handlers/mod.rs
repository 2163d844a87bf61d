// HTTP handlers
// Thin adapters: decode the request, call one service operation, render the result

pub mod health;
pub mod queue;
pub mod registrations;
pub mod teams;
