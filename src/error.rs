//! Error types shared by the service and HTTP layers.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Matchmaking found no opponent and could not persist a searching record.
    #[error("failed to record matchmaking search")]
    MatchmakingWriteError(#[source] StorageError),
    /// The problem catalog has nothing to draw from.
    #[error("no problems available for matchmaking")]
    NoProblemsAvailable,
    /// Room creation kept colliding with existing codes.
    #[error("could not allocate an unused room code")]
    RoomCodeExhausted,
    /// No room exists for the given code.
    #[error("room `{0}` not found")]
    RoomNotFound(String),
    /// Caller is not allowed to perform this operation.
    #[error("unauthorized: {0}")]
    NotAuthorized(String),
    /// Contest configuration rejected before any write happened.
    #[error("invalid contest configuration: {0}")]
    InvalidConfiguration(String),
    /// The participant already has this problem in their solved set.
    #[error("problem already credited to this participant")]
    AlreadySolved,
    /// The user is not a participant of the room.
    #[error("user `{user_id}` is not a participant of room `{code}`")]
    ParticipantNotFound {
        /// The user the solve was reported for.
        user_id: Uuid,
        /// The room the solve targeted.
        code: String,
    },
    /// The problem catalog answered with an error or was unreachable.
    #[error("problem catalog error: {0}")]
    CatalogError(String),
    /// The judging service did not settle a verdict within the polling budget.
    #[error("judging did not complete in time")]
    JudgeTimeout,
    /// The judging service answered with an error.
    #[error("judging service error: {0}")]
    JudgeServiceError(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Upstream collaborator failed or timed out.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::MatchmakingWriteError(source) => {
                AppError::ServiceUnavailable(source.to_string())
            }
            ServiceError::NoProblemsAvailable => {
                AppError::ServiceUnavailable("no problems available".into())
            }
            ServiceError::RoomCodeExhausted => {
                AppError::ServiceUnavailable("could not allocate an unused room code".into())
            }
            ServiceError::RoomNotFound(code) => AppError::NotFound(format!("room `{code}`")),
            ServiceError::NotAuthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidConfiguration(message) => AppError::BadRequest(message),
            ServiceError::AlreadySolved => {
                AppError::Conflict("problem already credited to this participant".into())
            }
            ServiceError::ParticipantNotFound { user_id, code } => {
                AppError::NotFound(format!("user `{user_id}` in room `{code}`"))
            }
            ServiceError::CatalogError(message) => AppError::BadGateway(message),
            ServiceError::JudgeTimeout => {
                AppError::BadGateway("judging did not complete in time".into())
            }
            ServiceError::JudgeServiceError(message) => AppError::BadGateway(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
