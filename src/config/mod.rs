//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path given as the CLI positional argument
//! 2. Default location:
//!    - **Linux/macOS:** `~/.pcb-layout-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.pcb-layout-mcp\config.json`
//!
//! A missing file at the default location is not an error: every section
//! has defaults. A missing file at an explicit path is.
//!
//! # Example Configuration
//!
//! ```json
//! {
//!   "allowed_paths": ["/home/me/boards"],
//!   "checks": { "min_clearance_mm": 0.25, "rotation_mode": "quarter_turn" },
//!   "labels": { "layers": { "power": "User.1", "analog": "User.2" } },
//!   "router": { "command": "java", "args": ["-jar", "freerouting.jar", "-de", "{input}", "-do", "{output}"] }
//! }
//! ```

mod settings;

pub use settings::{
    BoardConfig, ChecksConfig, Config, ExportConfig, LabelsConfig, LoggingConfig, RouterConfig,
};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.pcb-layout-mcp/`
/// - **Windows:** `%USERPROFILE%\.pcb-layout-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".pcb-layout-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses the configuration file.
///
/// If `path` is `None`, uses the platform-specific default location, falling
/// back to [`Config::default`] when no file exists there.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - Fields are invalid
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                tracing::debug!("No configuration file, using defaults");
                return Ok(Config::default());
            }
        },
    };

    if !config_path.exists() {
        return Err(ConfigError::NotFound { path: config_path });
    }

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    // Validate the configuration
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_path_in_app_dir() {
        let path = default_config_path().unwrap();
        assert!(path.ends_with(".pcb-layout-mcp/config.json"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn load_and_validate_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "board": { "backup_on_save": true } }"#).unwrap();
        assert!(load_config(Some(&path)).unwrap().board.backup_on_save);

        std::fs::write(&path, r#"{ "density": { "footprint_ratio": -1 } }"#).unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::ValidationError { .. })
        ));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
