use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::errors::RegistrationError;
use crate::domain::policy::Violation;

/// API error type with HTTP status code, machine-readable code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    /// Reason codes for capacity and conflict failures
    pub violations: Option<Vec<Violation>>,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            violations: None,
        }
    }

    fn with_violations(mut self, violations: Vec<Violation>) -> Self {
        self.violations = Some(violations);
        self
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION", message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE", message)
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        let message = err.to_string();
        match err {
            RegistrationError::Validation(_) => Self::bad_request(message),
            RegistrationError::CapacityViolation(violations) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "CAPACITY_VIOLATION",
                message,
            )
            .with_violations(violations),
            RegistrationError::InvalidTransition { .. } => {
                Self::new(StatusCode::CONFLICT, "INVALID_TRANSITION", message)
            }
            RegistrationError::TeamIncomplete(_) => {
                Self::new(StatusCode::CONFLICT, "TEAM_INCOMPLETE", message)
            }
            RegistrationError::PaymentDowngradeDenied { .. } => {
                Self::new(StatusCode::FORBIDDEN, "PAYMENT_DOWNGRADE_DENIED", message)
            }
            RegistrationError::NotFound { .. } => Self::not_found(message),
            RegistrationError::ConflictOnCommit(violations) => {
                Self::new(StatusCode::CONFLICT, "CONFLICT_ON_COMMIT", message)
                    .with_violations(violations)
            }
            RegistrationError::RegistrationClosed(_) => {
                Self::new(StatusCode::CONFLICT, "REGISTRATION_CLOSED", message)
            }
            RegistrationError::Storage(_) => {
                tracing::error!(error = %message, "storage failure");
                Self::internal_server_error(message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.message,
            "code": self.code,
        });
        if let Some(violations) = self.violations {
            body["violations"] = json!(violations);
        }

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn registration_errors_map_to_status_codes() {
        let cases = [
            (RegistrationError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                RegistrationError::CapacityViolation(vec![Violation::CapacityExceeded]),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (RegistrationError::TeamIncomplete(Uuid::new_v4()), StatusCode::CONFLICT),
            (RegistrationError::not_found("team", Uuid::new_v4()), StatusCode::NOT_FOUND),
            (RegistrationError::RegistrationClosed(Uuid::new_v4()), StatusCode::CONFLICT),
            (
                RegistrationError::Storage("down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn capacity_violation_keeps_codes() {
        let err = ApiError::from(RegistrationError::CapacityViolation(vec![
            Violation::CapacityExceeded,
        ]));

        assert_eq!(err.code, "CAPACITY_VIOLATION");
        assert_eq!(err.violations, Some(vec![Violation::CapacityExceeded]));
    }
}
