use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::Operator;
use crate::api::state::AppState;
use crate::services::queue_view::{RegistrationView, TeamSummary};

#[derive(Debug, Default, Deserialize)]
pub struct QueueFilter {
    pub event_id: Option<Uuid>,
}

/// GET /api/queue/individuals?event_id=
pub async fn list_queued_individuals(
    State(state): State<AppState>,
    _operator: Operator,
    Query(filter): Query<QueueFilter>,
) -> Result<Json<Vec<RegistrationView>>, ApiError> {
    Ok(Json(state.queue.list_queued_individuals(filter.event_id).await?))
}

/// GET /api/queue/teams?event_id=
pub async fn list_incomplete_teams(
    State(state): State<AppState>,
    _operator: Operator,
    Query(filter): Query<QueueFilter>,
) -> Result<Json<Vec<TeamSummary>>, ApiError> {
    Ok(Json(state.queue.list_incomplete_teams(filter.event_id).await?))
}
