use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};

use crate::services::lifecycle::PendingStep;

/// Standard JSON error body returned by every failed operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Conflict")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Additional detail, e.g. the individual unmet check-in steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Error taxonomy for the booking engine.
///
/// The booking service is the single point that translates lower-component
/// failures (inventory ledger, shift ledger, storage) into one of these
/// kinds; raw storage errors never escape uninterpreted.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid state transition: cannot move from '{from}' to '{attempted}'")]
    InvalidStateTransition { from: String, attempted: String },

    #[error("Preconditions not met: {}", format_steps(.0))]
    PreconditionsNotMet(Vec<PendingStep>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

fn format_steps(steps: &[PendingStep]) -> String {
    steps
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Builds an `InvalidStateTransition` from anything status-like.
    pub fn invalid_transition(from: impl ToString, attempted: impl ToString) -> Self {
        ServiceError::InvalidStateTransition {
            from: from.to_string(),
            attempted: attempted.to_string(),
        }
    }

    /// Returns the HTTP status code for this error.
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidStateTransition { .. } | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PreconditionsNotMet(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Returns the message suitable for HTTP responses. Internal errors
    /// return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Per-item detail for errors that carry a list (the unmet check-in
    /// steps), so staff can act on each missing item.
    pub fn response_details(&self) -> Option<Vec<String>> {
        match self {
            Self::PreconditionsNotMet(steps) => {
                Some(steps.iter().map(|s| s.to_string()).collect())
            }
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.response_details(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::StatusCode};

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Conflict("OPEN_SHIFT_EXISTS".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::invalid_transition("completed", "checked_in").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::PreconditionsNotMet(vec![PendingStep::CleanRoom]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::DatabaseError(DbErr::Custom("dsn leaked".into())).response_message(),
            "Database error"
        );
        assert_eq!(
            ServiceError::InternalError("stack trace".into()).response_message(),
            "Internal server error"
        );

        // User-facing errors keep the actual message
        assert_eq!(
            ServiceError::NotFound("Booking not found".into()).response_message(),
            "Not found: Booking not found"
        );
    }

    #[test]
    fn preconditions_error_lists_each_step() {
        let err = ServiceError::PreconditionsNotMet(vec![
            PendingStep::DeliverInventory,
            PendingStep::RegisterPassengers,
        ]);
        let details = err.response_details().unwrap();
        assert_eq!(details.len(), 2);
        assert!(details[0].contains("inventory"));
        assert!(details[1].contains("passengers"));
    }

    #[tokio::test]
    async fn error_response_body_shape() {
        let response =
            ServiceError::PreconditionsNotMet(vec![PendingStep::SettleBalance]).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.error, "Unprocessable Entity");
        assert_eq!(payload.details.unwrap().len(), 1);
    }
}
