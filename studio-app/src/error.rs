//! Application error types.

use studio_core::StudioError;
use studio_renderer::RenderError;
use thiserror::Error;

use crate::validation::ValidationError;

/// Result type for studio application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by the studio orchestrator and its collaborators.
#[derive(Debug, Error)]
pub enum AppError {
    /// Scene, ledger or progress failure, including insufficient credits.
    #[error(transparent)]
    Core(#[from] StudioError),

    /// Export failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Input was rejected before any external call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The external service is rate limited or out of quota.
    #[error("Service quota exhausted: {0}")]
    Quota(String),

    /// The external service failed permanently.
    #[error("Service error: {0}")]
    Service(String),

    /// The external service answered with something unusable.
    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    /// A project record does not exist.
    #[error("Project not found: {0}")]
    ProjectNotFound(u64),

    /// The project store failed.
    #[error("Project storage error: {0}")]
    Project(String),
}

impl AppError {
    /// Whether the failed call may succeed if repeated.
    ///
    /// Only quota errors are retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Quota(_))
    }

    /// Whether the caller ran out of credits.
    #[must_use]
    pub const fn is_insufficient_credits(&self) -> bool {
        matches!(self, Self::Core(StudioError::InsufficientCredits { .. }))
    }

    /// Classify a raw service failure message.
    ///
    /// HTTP 429 and `RESOURCE_EXHAUSTED` map to [`AppError::Quota`],
    /// everything else to [`AppError::Service`].
    #[must_use]
    pub fn from_service_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("429") || message.contains("RESOURCE_EXHAUSTED") {
            Self::Quota(message)
        } else {
            Self::Service(message)
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}
