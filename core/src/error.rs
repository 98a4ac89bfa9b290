//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.
//!
//! Only fatal conditions live here. Missing nodes and unresolved anchors are
//! reported as [`crate::outcome::PatchOutcome`] values instead.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// JSON (de)serialization failure.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// YAML (de)serialization failure.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// An anchor pattern failed to compile.
    #[display("Pattern Error: {_0}")]
    Pattern(regex::Error),

    /// An artifact could not be loaded into the structural model.
    /// Aborts the pipeline before any stage runs.
    #[from(ignore)]
    #[display("Malformed artifact '{path}': {reason}")]
    MalformedArtifact {
        /// Path or logical name of the offending artifact.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl AppError {
    /// Shorthand for building a [`AppError::MalformedArtifact`].
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::MalformedArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_malformed_display() {
        let app_err = AppError::malformed("AndroidManifest.json", "root is not an object");
        assert_eq!(
            format!("{}", app_err),
            "Malformed artifact 'AndroidManifest.json': root is not an object"
        );
    }

    #[test]
    fn test_pattern_conversion() {
        let bad = regex::Regex::new("(unclosed").unwrap_err();
        let app_err: AppError = bad.into();
        assert!(matches!(app_err, AppError::Pattern(_)));
    }
}
