use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{health, queue, registrations, teams};
use crate::api::state::AppState;

/// Builds the HTTP router with every registry route
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Registration routes
        .route("/api/registrations", post(registrations::create_registration))
        .route(
            "/api/registrations/:id",
            patch(registrations::edit_registration)
                .delete(registrations::delete_registration),
        )
        .route("/api/registrations/:id/status", post(registrations::transition))
        .route("/api/registrations/:id/payment", post(registrations::set_payment))
        // Team routes
        .route("/api/teams", post(teams::create_team))
        .route(
            "/api/teams/:id",
            get(teams::get_team)
                .patch(teams::update_team)
                .delete(teams::delete_team),
        )
        .route("/api/teams/:id/roles", post(teams::assign_role))
        .route("/api/teams/:id/roles/batch", post(teams::apply_batch))
        .route("/api/teams/:id/roles/auto", post(teams::auto_assign_roles))
        .route("/api/teams/:id/members", post(teams::add_member))
        .route(
            "/api/teams/:id/members/:registration_id",
            delete(teams::remove_member),
        )
        .route("/api/teams/:id/confirm", post(teams::confirm_team))
        .route("/api/teams/:id/payment", post(teams::confirm_team_payment))
        .route("/api/teams/:id/merge", post(teams::merge))
        // Queue views
        .route("/api/queue/individuals", get(queue::list_queued_individuals))
        .route("/api/queue/teams", get(queue::list_incomplete_teams))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
