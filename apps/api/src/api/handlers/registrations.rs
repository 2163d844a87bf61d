use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::Operator;
use crate::api::state::AppState;
use crate::domain::registration::RegistrationStatus;
use crate::services::queue_view::RegistrationView;
use crate::services::registrations::{NewRegistration, RegistrationEdit};

/// Request body for a status change
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: RegistrationStatus,
}

/// Request body for a payment change
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub paid: bool,
}

/// Register a sportsperson individually
///
/// POST /api/registrations
pub async fn create_registration(
    State(state): State<AppState>,
    operator: Operator,
    Json(req): Json<NewRegistration>,
) -> Result<(StatusCode, Json<RegistrationView>), ApiError> {
    let registration = state
        .registrations
        .create_registration(req, operator.role)
        .await?;
    let view = state.queue.registration(&registration).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Edit discipline and/or cost
///
/// PATCH /api/registrations/:id
pub async fn edit_registration(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
    Json(req): Json<RegistrationEdit>,
) -> Result<Json<RegistrationView>, ApiError> {
    let registration = state
        .registrations
        .edit_registration(id, req, operator.role)
        .await?;
    Ok(Json(state.queue.registration(&registration).await?))
}

/// Delete a registration
///
/// DELETE /api/registrations/:id
pub async fn delete_registration(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .registrations
        .delete_registration(id, operator.role)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a registration to another status
///
/// POST /api/registrations/:id/status
pub async fn transition(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<RegistrationView>, ApiError> {
    let registration = state.status.transition(id, req.status, operator.role).await?;
    Ok(Json(state.queue.registration(&registration).await?))
}

/// Set the payment flag
///
/// POST /api/registrations/:id/payment
pub async fn set_payment(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<RegistrationView>, ApiError> {
    let registration = state.status.set_payment(id, req.paid, operator.role).await?;
    Ok(Json(state.queue.registration(&registration).await?))
}
