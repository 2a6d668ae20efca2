//! # AppError
//!
//! Centralized error handling for IGX.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all igx-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Resource not found (e.g., User, Post)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., post too long, handle with spaces)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing or invalid session, wrong password
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Resource already exists (e.g., duplicate handle or email)
    #[error("conflict: {0}")]
    Conflict(String),
}

/// A specialized Result type for IGX logic.
pub type Result<T> = std::result::Result<T, AppError>;
