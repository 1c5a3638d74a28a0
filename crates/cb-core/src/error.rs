//! # AppError
//!
//! Centralized error handling for the Campus Board ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all cb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Category, Thread, Comment)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty thread title, bad preview URL)
    #[error("validation error: {0}")]
    Validation(String),

    /// Admin gate failure
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The visitor's session scope cannot be read or written
    #[error("session storage unavailable: {0}")]
    Storage(String),

    /// Infrastructure failure (e.g., DB down, outbound fetch failed)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wraps an infrastructure failure, preserving its message.
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for Campus Board logic.
pub type Result<T> = std::result::Result<T, AppError>;
