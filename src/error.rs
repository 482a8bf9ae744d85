use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{
    dao::identity::IdentityError,
    state::{
        lifeline::LifelineError, roster::RosterError, round::RoundError,
        state_machine::TransitionError,
    },
};

/// Message shown for every rejected match code, whatever the cause.
pub const INVALID_CODE_MESSAGE: &str = "invalid code";

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The request collides with existing data (duplicate name, spent lifeline).
    #[error("conflict: {0}")]
    Conflict(String),
    /// Authentication failed or no user is signed in.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// A match code could not be decoded.
    #[error("invalid code")]
    InvalidMatchCode,
    /// Not even the first batch of a round could be produced.
    #[error("question acquisition failed: {0}")]
    Acquisition(String),
    /// The identity store medium failed.
    #[error("identity store unavailable")]
    Identity(#[from] IdentityError),
}

impl From<RosterError> for ServiceError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::DuplicateName(_) => ServiceError::Conflict(err.to_string()),
            other => ServiceError::InvalidInput(other.to_string()),
        }
    }
}

impl From<LifelineError> for ServiceError {
    fn from(err: LifelineError) -> Self {
        match err {
            LifelineError::AlreadyUsed { .. } => ServiceError::Conflict(err.to_string()),
            other => ServiceError::InvalidState(other.to_string()),
        }
    }
}

impl From<RoundError> for ServiceError {
    fn from(err: RoundError) -> Self {
        match err {
            RoundError::OptionUnavailable(_) => ServiceError::InvalidInput(err.to_string()),
            other => ServiceError::InvalidState(other.to_string()),
        }
    }
}

impl From<TransitionError> for ServiceError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::CategoryOutsidePool { .. }
            | TransitionError::MixedCategoryChoice { .. } => {
                ServiceError::InvalidInput(err.to_string())
            }
            other => ServiceError::InvalidState(other.to_string()),
        }
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
    /// Well-formed request whose content cannot be processed.
    #[error("{0}")]
    Unprocessable(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidMatchCode => AppError::Unprocessable(INVALID_CODE_MESSAGE.into()),
            ServiceError::Acquisition(message) => AppError::ServiceUnavailable(message),
            ServiceError::Identity(source) => {
                error!(error = %source, "identity store failure");
                AppError::Internal("identity store unavailable".into())
            }
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
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::roster::TeamSlot;
    use crate::state::lifeline::LifelineKind;

    #[test]
    fn duplicate_names_and_spent_lifelines_are_conflicts() {
        let err: ServiceError = RosterError::DuplicateName("Sami".into()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err: ServiceError = LifelineError::AlreadyUsed {
            slot: TeamSlot::A,
            kind: LifelineKind::FiftyFifty,
        }
        .into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn invalid_match_codes_share_one_message() {
        let err: AppError = ServiceError::InvalidMatchCode.into();
        assert_eq!(err.to_string(), "invalid code");
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
