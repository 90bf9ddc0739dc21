//! API error envelope and service error mapping.

use crate::bridge::services::BridgeSessionError;
use crate::publication::{ports::AgentComponentRepositoryError, services::PublicationServiceError};
use crate::skill::services::SkillRegistryServiceError;
use crate::tenant::ports::IdentityError;
use crate::tool_registry::{
    ports::McpServerRegistryError,
    services::{HealthMonitorError, McpServerRegistryServiceError, RestartCoordinatorError},
};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource missing or owned by another tenant.
    NotFound,
    /// Identity or bridge token missing, unknown or revoked.
    Unauthorized,
    /// Request failed validation.
    Validation,
    /// Request conflicts with current state.
    Conflict,
    /// Unexpected server-side failure.
    Internal,
}

impl ErrorCode {
    /// Returns the HTTP status for the code.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code.
    pub code: ErrorCode,
    /// Description of the failure.
    pub message: String,
}

/// Error returned by every handler.
#[derive(Debug, Clone)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
}

impl ApiError {
    /// Creates an error with an explicit code.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// `404 NOT_FOUND`.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// `401 UNAUTHORIZED`.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// `400 VALIDATION`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// `409 CONFLICT`.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// `500 INTERNAL`. The cause is logged, not returned.
    #[must_use]
    pub fn internal(cause: &dyn std::error::Error) -> Self {
        tracing::error!(err = %cause, "request failed");
        Self::new(ErrorCode::Internal, "internal server error")
    }

    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };
        (self.code.status(), Json(body)).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unauthorized => Self::unauthorized(err.to_string()),
            IdentityError::Provider(_) => Self::internal(&err),
        }
    }
}

impl From<PublicationServiceError> for ApiError {
    fn from(err: PublicationServiceError) -> Self {
        match err {
            PublicationServiceError::Domain(_) => Self::validation(err.to_string()),
            PublicationServiceError::NotFound(_)
            | PublicationServiceError::Repository(AgentComponentRepositoryError::NotFound(_)) => {
                Self::not_found(err.to_string())
            }
            PublicationServiceError::Repository(AgentComponentRepositoryError::Conflict) => {
                Self::conflict("another publication won the race; retry the request")
            }
            PublicationServiceError::Repository(_) => Self::internal(&err),
        }
    }
}

impl From<SkillRegistryServiceError> for ApiError {
    fn from(err: SkillRegistryServiceError) -> Self {
        match err {
            SkillRegistryServiceError::Domain(_) => Self::validation(err.to_string()),
            SkillRegistryServiceError::NotFound(_) => Self::not_found(err.to_string()),
            SkillRegistryServiceError::Repository(_) => Self::internal(&err),
        }
    }
}

impl From<McpServerRegistryServiceError> for ApiError {
    fn from(err: McpServerRegistryServiceError) -> Self {
        match err {
            McpServerRegistryServiceError::Domain(_) => Self::validation(err.to_string()),
            McpServerRegistryServiceError::NotFound(_)
            | McpServerRegistryServiceError::Repository(McpServerRegistryError::NotFound(_)) => {
                Self::not_found(err.to_string())
            }
            McpServerRegistryServiceError::Repository(
                McpServerRegistryError::DuplicateServerName(_),
            ) => Self::conflict(err.to_string()),
            McpServerRegistryServiceError::Repository(_) => Self::internal(&err),
        }
    }
}

impl From<RestartCoordinatorError> for ApiError {
    fn from(err: RestartCoordinatorError) -> Self {
        Self::internal(&err)
    }
}

impl From<HealthMonitorError> for ApiError {
    fn from(err: HealthMonitorError) -> Self {
        match err {
            HealthMonitorError::NotFound(_) => Self::not_found(err.to_string()),
            HealthMonitorError::Repository(_) => Self::internal(&err),
        }
    }
}

impl From<BridgeSessionError> for ApiError {
    fn from(err: BridgeSessionError) -> Self {
        match err {
            BridgeSessionError::Unauthorized => Self::unauthorized(err.to_string()),
            BridgeSessionError::ToolNotFound(_) => Self::not_found(err.to_string()),
            BridgeSessionError::Identity(_)
            | BridgeSessionError::Tokens(_)
            | BridgeSessionError::Agents(_)
            | BridgeSessionError::Workflows(_) => Self::internal(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publication::domain::AgentComponentId;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorCode::NotFound, 404)]
    #[case(ErrorCode::Unauthorized, 401)]
    #[case(ErrorCode::Validation, 400)]
    #[case(ErrorCode::Conflict, 409)]
    #[case(ErrorCode::Internal, 500)]
    fn codes_map_to_statuses(#[case] code: ErrorCode, #[case] status: u16) {
        assert_eq!(code.status().as_u16(), status);
    }

    #[test]
    fn exhausted_publish_conflict_is_409() {
        let err = PublicationServiceError::Repository(AgentComponentRepositoryError::Conflict);

        assert_eq!(ApiError::from(err).code(), ErrorCode::Conflict);
    }

    #[test]
    fn foreign_component_is_404() {
        let err = PublicationServiceError::NotFound(AgentComponentId::new());

        assert_eq!(ApiError::from(err).code(), ErrorCode::NotFound);
    }
}
