#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use derive_more::{Display, From};
use droidpatch_core::AppError;

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// Failure inside the patching engine.
    #[display("{}", _0)]
    Core(AppError),

    /// A run completed but left patches unplaced under `--strict`.
    #[from(ignore)]
    #[display("{} patch(es) could not be placed", _0)]
    Misses(usize),

    /// A second pipeline pass still changed the project.
    #[from(ignore)]
    #[display("Pipeline is not idempotent: a second run changed {}", _0)]
    NotIdempotent(String),

    /// General failure message.
    #[display("Operation failed: {}", _0)]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for CliError {}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_conversion() {
        let err: CliError = AppError::General("x".into()).into();
        assert!(matches!(err, CliError::Core(_)));
        assert_eq!(err.to_string(), "General Error: x");
    }

    #[test]
    fn test_misses_display() {
        assert_eq!(
            CliError::Misses(3).to_string(),
            "3 patch(es) could not be placed"
        );
    }
}
