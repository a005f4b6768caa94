//! # AppError
//!
//! Centralized error handling for RoboHub.
//! Maps domain-specific failures to actionable error types; the API crate
//! turns each variant into an HTTP status.

use thiserror::Error;

/// The primary error type for all rh-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Article, CAD model). Carries the entity
    /// name and the identifier that was looked up.
    #[error("{0} not found")]
    NotFound(String, String),

    /// Validation failure (e.g., missing title, unknown status)
    #[error("{0}")]
    ValidationError(String),

    /// A path identifier that is not a well-formed id.
    #[error("Invalid ID format")]
    InvalidId(String),

    /// The request body exceeded the configured upload cap.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// No session identity resolved for an endpoint that requires one.
    #[error("Unauthorized")]
    Unauthorized,

    /// An identity resolved but is not allowed to touch the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Infrastructure failure (e.g., DB down, storage error)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Alternate formatting keeps the whole context chain.
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for RoboHub logic.
pub type Result<T> = std::result::Result<T, AppError>;
