use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::auth::jwt::verify_token;
use crate::domain::actor::ActorRole;

/// Authenticated operator extracted from the bearer token
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(operator: Operator) -> Result<String, ApiError> {
///     Ok(format!("Hello {} ({})", operator.id, operator.role))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Operator {
    pub id: Uuid,
    pub role: ActorRole,
}

#[async_trait]
impl FromRequestParts<AppState> for Operator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Extract the authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        // Extract bearer token
        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::unauthorized("Invalid authorization format. Use: Bearer <token>")
        })?;

        let claims = verify_token(token, &state.jwt_secret)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(Operator {
            id: claims.sub,
            role: claims.role,
        })
    }
}
