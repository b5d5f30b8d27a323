//! Error types for board document operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Boxed error from an external collaborator (HTTP client, subprocess, ...).
pub type CollaboratorSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while loading, inspecting or editing a board.
#[derive(Debug, Error)]
pub enum BoardError {
    /// Failed to open or read the file.
    #[error("Failed to read file: {path}")]
    FileRead {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write the file.
    #[error("Failed to write file: {path}")]
    FileWrite {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The board document is not valid JSON or does not match the model.
    #[error("Failed to parse board document: {path}")]
    Parse {
        /// Path to the file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The board could not be serialised.
    #[error("Failed to serialise board document")]
    Serialise {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A referenced footprint, net or layer does not exist.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// What kind of item was looked up ("Footprint", "Net", ...).
        kind: &'static str,
        /// The missing reference.
        name: String,
    },

    /// Malformed input, rejected before anything was mutated.
    #[error("Invalid input: {message}")]
    Validation {
        /// Description of what's wrong.
        message: String,
    },

    /// The board has no Edge.Cuts geometry.
    #[error("The board outline (Edge.Cuts) has not been defined")]
    MissingOutline,

    /// The board has no geometry to measure.
    #[error("The board contains no geometry")]
    MissingGeometry,

    /// An external collaborator (exporter, autorouter, web fetcher) failed.
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        /// Which collaborator failed.
        collaborator: &'static str,
        /// Description of the failure.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<CollaboratorSource>,
    },
}

impl BoardError {
    /// Creates a file read error.
    pub fn file_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a file write error.
    pub fn file_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a footprint-not-found error.
    pub fn footprint_not_found(reference: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Footprint",
            name: reference.into(),
        }
    }

    /// Creates a net-not-found error.
    pub fn net_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Net",
            name: name.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a collaborator failure without an underlying cause.
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a collaborator failure wrapping its cause.
    pub fn collaborator_with(
        collaborator: &'static str,
        message: impl Into<String>,
        source: impl Into<CollaboratorSource>,
    ) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = BoardError::footprint_not_found("U7");
        assert_eq!(err.to_string(), "Footprint not found: U7");
    }

    #[test]
    fn collaborator_keeps_source() {
        let io = io::Error::other("exit status 2");
        let err = BoardError::collaborator_with("Autorouter", "process failed", io);
        assert_eq!(err.to_string(), "Autorouter failed: process failed");
        assert!(std::error::Error::source(&err).is_some());
    }
}
