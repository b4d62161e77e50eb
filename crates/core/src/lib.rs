//! Shared primitives for all Rust crates in sparkroles.

#![forbid(unsafe_code)]

/// Authentication primitives shared across crates.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::AccessToken;

/// Result type used across sparkroles crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
///
/// Transport-level variants are produced by API adapters and are surfaced to
/// callers without being rewrapped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated (missing, expired or revoked token).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed to access the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Remote service kept throttling requests until retries ran out.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network failure or unexpected response status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote service answered with a payload of the wrong shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
