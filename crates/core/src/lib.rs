//! Shared primitives for all Rust crates in rolesync.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across rolesync crates.
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

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// One or more configuration settings are missing or malformed.
    ///
    /// Every problem found is carried so operators can fix them in one pass.
    #[error("configuration error: {}", .0.join("; "))]
    Configuration(Vec<String>),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Input resolves to more than one candidate or conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is authenticated but lacks the privileges the operation needs.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A remote dependency could not be reached or kept failing.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// A remote dependency answered but refused the request.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn configuration_error_lists_every_problem() {
        let error = AppError::Configuration(vec![
            "SRC_ENDPOINT is required".to_owned(),
            "SRC_ACCESS_TOKEN is required".to_owned(),
        ]);

        assert_eq!(
            error.to_string(),
            "configuration error: SRC_ENDPOINT is required; SRC_ACCESS_TOKEN is required"
        );
    }
}
