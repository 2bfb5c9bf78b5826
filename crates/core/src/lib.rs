//! Shared primitives for all Rust crates in Reclaim.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Result type used across Reclaim crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated against the remote service.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but cannot see or mutate the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Remote call failed in a way that may succeed on a later run.
    #[error("transient error: {0}")]
    Transient(String),

    /// A remote payload or value could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse error classes used by callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The credential cannot see this scope (forbidden or not found).
    AccessDenied,
    /// Throttling, server-side or transport failure.
    Transient,
    /// Anything that will not resolve by itself.
    Fatal,
    /// Malformed data.
    Parse,
}

impl AppError {
    /// Classifies the error for retention accounting.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Forbidden(_) | Self::NotFound(_) => ErrorKind::AccessDenied,
            Self::Transient(_) => ErrorKind::Transient,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Validation(_) | Self::Unauthorized(_) | Self::Internal(_) => ErrorKind::Fatal,
        }
    }

    /// Maps an HTTP-like status code returned by a remote API to an error.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = format!("status {status}: {}", message.into());
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            408 | 429 | 500..=599 => Self::Transient(message),
            _ => Self::Internal(message),
        }
    }
}
