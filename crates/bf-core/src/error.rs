//! # AppError
//!
//! Centralized error handling for birdfeed.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all bf-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Account)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., tweet too long, malformed email)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing, invalid or expired token; bad credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down, counter row missing)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Resource already exists (e.g., duplicate username, double follow)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation does not apply to the current state (e.g., unfollow without a follow)
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl AppError {
    pub fn account_not_found(identity: &str) -> Self {
        AppError::NotFound("account".to_string(), identity.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for birdfeed logic.
pub type Result<T> = std::result::Result<T, AppError>;
