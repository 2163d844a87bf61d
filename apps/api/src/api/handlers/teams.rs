use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::Operator;
use crate::api::state::AppState;
use crate::domain::registration::Role;
use crate::domain::team::RoleChange;
use crate::services::queue_view::TeamDetails;
use crate::services::registrations::{NewTeam, TeamInfo};
use crate::services::roster_engine::AddMember;

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub registration_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub changes: Vec<RoleChange>,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub secondary_ids: Vec<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Number of members a bulk operation changed
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub team_id: Uuid,
    pub changed: usize,
}

/// Create a team with its initial roster
///
/// POST /api/teams
pub async fn create_team(
    State(state): State<AppState>,
    operator: Operator,
    Json(req): Json<NewTeam>,
) -> Result<(StatusCode, Json<TeamDetails>), ApiError> {
    let roster = state.registrations.create_team(req, operator.role).await?;
    Ok((StatusCode::CREATED, Json(state.queue.describe(&roster).await?)))
}

/// Get a team with its members grouped by role
///
/// GET /api/teams/:id
pub async fn get_team(
    State(state): State<AppState>,
    _operator: Operator,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamDetails>, ApiError> {
    Ok(Json(state.queue.get_team_details(id).await?))
}

/// Rename a team and set its home city
///
/// PATCH /api/teams/:id
pub async fn update_team(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
    Json(req): Json<TeamInfo>,
) -> Result<Json<TeamDetails>, ApiError> {
    let roster = state
        .registrations
        .update_team_info(id, req, operator.role)
        .await?;
    Ok(Json(state.queue.describe(&roster).await?))
}

/// Delete a team and its registrations
///
/// DELETE /api/teams/:id
pub async fn delete_team(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.registrations.delete_team(id, operator.role).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assign a role to one registration
///
/// POST /api/teams/:id/roles
pub async fn assign_role(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<TeamDetails>, ApiError> {
    let roster = state
        .roster
        .assign_role(id, req.registration_id, req.role, operator.role)
        .await?;
    Ok(Json(state.queue.describe(&roster).await?))
}

/// Apply several role changes at once
///
/// POST /api/teams/:id/roles/batch
pub async fn apply_batch(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<TeamDetails>, ApiError> {
    let roster = state
        .roster
        .apply_batch(id, &req.changes, operator.role)
        .await?;
    Ok(Json(state.queue.describe(&roster).await?))
}

/// Hand out dragon-boat roles automatically
///
/// POST /api/teams/:id/roles/auto
pub async fn auto_assign_roles(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamDetails>, ApiError> {
    let roster = state.roster.auto_assign_roles(id, operator.role).await?;
    Ok(Json(state.queue.describe(&roster).await?))
}

/// Add a member to a team
///
/// POST /api/teams/:id/members
pub async fn add_member(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMember>,
) -> Result<Json<TeamDetails>, ApiError> {
    let roster = state.roster.add_member(id, req, operator.role).await?;
    Ok(Json(state.queue.describe(&roster).await?))
}

/// Remove a member; responds 204 when the team was deleted with it
///
/// DELETE /api/teams/:id/members/:registration_id
pub async fn remove_member(
    State(state): State<AppState>,
    operator: Operator,
    Path((id, registration_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    match state
        .roster
        .remove_member(id, registration_id, operator.role)
        .await?
    {
        Some(roster) => Ok(Json(state.queue.describe(&roster).await?).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Confirm every member of a complete team
///
/// POST /api/teams/:id/confirm
pub async fn confirm_team(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
) -> Result<Json<CountResponse>, ApiError> {
    let changed = state.status.confirm_team(id, operator.role).await?;
    Ok(Json(CountResponse { team_id: id, changed }))
}

/// Mark every member of a complete team as paid
///
/// POST /api/teams/:id/payment
pub async fn confirm_team_payment(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
) -> Result<Json<CountResponse>, ApiError> {
    let changed = state.status.confirm_team_payment(id, operator.role).await?;
    Ok(Json(CountResponse { team_id: id, changed }))
}

/// Merge other teams into this one
///
/// POST /api/teams/:id/merge
pub async fn merge(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<TeamDetails>, ApiError> {
    let roster = state
        .merge
        .merge(id, &req.secondary_ids, req.name, operator.role)
        .await?;
    Ok(Json(state.queue.describe(&roster).await?))
}
