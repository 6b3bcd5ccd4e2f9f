//! Unified error types for the GCS ecosystem
//!
//! This module provides a common error type [`ScreenError`] that can represent
//! errors from any part of the screening pipeline. Domain-specific error types
//! can be converted to `ScreenError` for uniform handling at API boundaries.
//!
//! # Example
//!
//! ```ignore
//! use gcs_core::{ScreenError, ScreenResult};
//!
//! fn screen_case(path: &str) -> ScreenResult<()> {
//!     let case = load_case(path)?;
//!     rank_contingencies(&case)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all GCS operations.
///
/// Structural errors ([`ScreenError::Structural`]) indicate a malformed case
/// document or an ambiguous identity (e.g. two contingencies sharing one id)
/// and always abort the whole case. Configuration errors cover invalid
/// strategy selectors and weight/model artifacts that do not match the run.
#[derive(Error, Debug)]
pub enum ScreenError {
    /// I/O errors (file access, directory walks, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed case structure (duplicate keys, unknown references)
    #[error("Structural error: {0}")]
    Structural(String),

    /// Configuration errors (selectors, weight/model artifacts)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using ScreenError.
pub type ScreenResult<T> = Result<T, ScreenError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for ScreenError {
    fn from(err: anyhow::Error) -> Self {
        ScreenError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for ScreenError {
    fn from(s: String) -> Self {
        ScreenError::Other(s)
    }
}

impl From<&str> for ScreenError {
    fn from(s: &str) -> Self {
        ScreenError::Other(s.to_string())
    }
}

// JSON parsing errors
impl From<serde_json::Error> for ScreenError {
    fn from(err: serde_json::Error) -> Self {
        ScreenError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScreenError::Structural("duplicate contingency id 'DEF_12'".into());
        assert!(err.to_string().contains("Structural error"));
        assert!(err.to_string().contains("DEF_12"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let screen_err: ScreenError = io_err.into();
        assert!(matches!(screen_err, ScreenError::Io(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn example_fn() -> ScreenResult<i32> {
            Ok(42)
        }
        assert_eq!(example_fn().unwrap(), 42);
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> ScreenResult<()> {
            Err(ScreenError::Config("score type 7 is not a strategy".into()))
        }

        fn outer() -> ScreenResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
