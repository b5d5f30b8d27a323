//! Error types for pcb-layout-mcp configuration.
//!
//! Board operation errors live in [`crate::board::error`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_path() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/boards/config.json"),
        };
        assert_eq!(
            error.to_string(),
            "configuration file not found: /boards/config.json"
        );
    }

    #[test]
    fn parse_error_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = ConfigError::ParseError {
            path: PathBuf::from("c.json"),
            source,
        };
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "router.timeout_secs must be greater than zero".to_string(),
        };
        assert!(error.to_string().ends_with("greater than zero"));
    }
}
