//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::board::edit::MAX_COORDINATE_MM;
use crate::board::Layer;
use crate::datasheet::DatasheetOptions;
use crate::error::ConfigError;
use crate::export::DEFAULT_LAYERS;
use crate::placement::{DensityThresholds, PlacementOptions, RotationMode, DEFAULT_MIN_CLEARANCE_MM};

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Directories board files may be read from and written to.
    /// Empty means the current working directory.
    #[serde(default)]
    pub allowed_paths: Vec<PathBuf>,

    /// Placement check settings.
    #[serde(default)]
    pub checks: ChecksConfig,

    /// Power density advisory thresholds.
    #[serde(default)]
    pub density: DensityThresholds,

    /// Area labelling settings.
    #[serde(default)]
    pub labels: LabelsConfig,

    /// Image export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Board file settings.
    #[serde(default)]
    pub board: BoardConfig,

    /// External autorouter settings.
    #[serde(default)]
    pub router: RouterConfig,

    /// Datasheet fetcher settings.
    #[serde(default)]
    pub datasheet: DatasheetOptions,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::ValidationError { message });

        let clearance = self.checks.min_clearance_mm;
        if clearance > MAX_COORDINATE_MM {
            return invalid(format!(
                "checks.min_clearance_mm must not exceed {MAX_COORDINATE_MM} mm, got {clearance}"
            ));
        }
        if !clearance.is_finite() || clearance < 0.0 {
            return invalid(format!(
                "checks.min_clearance_mm must be a non-negative number, got {}",
                self.checks.min_clearance_mm
            ));
        }

        let thresholds = [
            ("footprint_ratio", self.density.footprint_ratio),
            ("effective_ratio", self.density.effective_ratio),
            ("axis_ratio", self.density.axis_ratio),
        ];
        for (name, value) in thresholds {
            if !(0.0..=100.0).contains(&value) {
                return invalid(format!(
                    "density.{name} must be between 0 and 100, got {value}"
                ));
            }
        }

        if self.router.timeout_secs == 0 {
            return invalid("router.timeout_secs must be greater than zero".to_string());
        }
        if self.datasheet.timeout_secs == 0 {
            return invalid("datasheet.timeout_secs must be greater than zero".to_string());
        }
        if !self.datasheet.url_template.contains("{ic}") {
            return invalid("datasheet.url_template must contain '{ic}'".to_string());
        }
        if let Err(e) = regex::Regex::new(&self.datasheet.section_pattern) {
            return invalid(format!("datasheet.section_pattern is not a valid regex: {e}"));
        }

        let levels = ["trace", "debug", "info", "warn", "error"];
        if !levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return invalid(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Placement check configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecksConfig {
    /// Courtyard clearance margin in mm.
    #[serde(default = "default_min_clearance")]
    pub min_clearance_mm: f64,

    /// Courtyard rotation policy: "quarter_turn" or "oriented".
    #[serde(default)]
    pub rotation_mode: RotationMode,

    /// Restore the original orientation after a placement sweep.
    #[serde(default = "default_true")]
    pub restore_orientation: bool,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            min_clearance_mm: default_min_clearance(),
            rotation_mode: RotationMode::default(),
            restore_orientation: default_true(),
        }
    }
}

impl ChecksConfig {
    /// Placement evaluator options derived from this section.
    #[must_use]
    pub const fn placement_options(&self) -> PlacementOptions {
        PlacementOptions {
            min_clearance_mm: self.min_clearance_mm,
            rotation_mode: self.rotation_mode,
            restore_orientation: self.restore_orientation,
        }
    }
}

const fn default_min_clearance() -> f64 {
    DEFAULT_MIN_CLEARANCE_MM
}

const fn default_true() -> bool {
    true
}

/// Area labelling configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelsConfig {
    /// Layer per label function, e.g. `{"power": "User.1"}`.
    #[serde(default)]
    pub layers: HashMap<String, Layer>,

    /// Layer for functions not listed in `layers`.
    #[serde(default = "default_label_layer")]
    pub default_layer: Layer,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            layers: HashMap::new(),
            default_layer: default_label_layer(),
        }
    }
}

const fn default_label_layer() -> Layer {
    Layer::FrontSilk
}

/// Image export configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Layers plotted when a request does not name any.
    #[serde(default = "default_export_layers")]
    pub layers: Vec<Layer>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            layers: default_export_layers(),
        }
    }
}

fn default_export_layers() -> Vec<Layer> {
    DEFAULT_LAYERS.to_vec()
}

/// Board file configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardConfig {
    /// Keep a timestamped copy of the previous file on every save.
    #[serde(default)]
    pub backup_on_save: bool,
}

/// External autorouter configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Router executable.
    #[serde(default = "default_router_command")]
    pub command: String,

    /// Arguments; `{input}` and `{output}` are replaced by the exchange
    /// file paths.
    #[serde(default = "default_router_args")]
    pub args: Vec<String>,

    /// Seconds before the router process is killed.
    #[serde(default = "default_router_timeout")]
    pub timeout_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            command: default_router_command(),
            args: default_router_args(),
            timeout_secs: default_router_timeout(),
        }
    }
}

impl RouterConfig {
    /// Router timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_router_command() -> String {
    "pcb-autorouter".to_string()
}

fn default_router_args() -> Vec<String> {
    vec!["{input}".to_string(), "{output}".to_string()]
}

const fn default_router_timeout() -> u64 {
    300
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
