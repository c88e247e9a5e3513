//! Engine configuration module.
//!
//! Handles loading, validating, and merging a `config.toml`. Stock defaults
//! are overridden by whatever keys the user file sets; everything is read
//! once at startup and never mutated by the engine.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [limits]
//! max_input_bytes = 5242880  # Reject larger inputs before decoding (5 MiB)
//! max_output_pixels = 50000000  # Largest raster resize, merge or rotate may produce
//!
//! [defaults]
//! format = "JPG"             # Target format when a request names none
//!
//! [geometry]
//! strict_crop = false        # Fail invalid crops instead of re-encoding unchanged
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [limits]
//! max_input_bytes = 20971520
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{CropPolicy, DEFAULT_FORMAT_TOKEN, resolve_format};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default upper bound on a single input buffer.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 5 * 1024 * 1024;

/// Default upper bound on the pixel count of a grown raster (50 MP).
pub const DEFAULT_MAX_OUTPUT_PIXELS: u64 = 50_000_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Engine configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Input size limits.
    pub limits: LimitsConfig,
    /// Values used when a request leaves a parameter out.
    pub defaults: DefaultsConfig,
    /// Geometry validation behaviour.
    pub geometry: GeometryConfig,
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_input_bytes == 0 {
            return Err(ConfigError::Validation(
                "limits.max_input_bytes must be greater than 0".into(),
            ));
        }
        if self.limits.max_output_pixels == 0 {
            return Err(ConfigError::Validation(
                "limits.max_output_pixels must be greater than 0".into(),
            ));
        }
        if let Err(e) = resolve_format(&self.defaults.format) {
            return Err(ConfigError::Validation(format!("defaults.format: {e}")));
        }
        Ok(())
    }

    /// Crop behaviour selected by `geometry.strict_crop`.
    pub fn crop_policy(&self) -> CropPolicy {
        if self.geometry.strict_crop {
            CropPolicy::Strict
        } else {
            CropPolicy::Lenient
        }
    }
}

/// Input and output size limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest accepted input buffer in bytes, checked before decoding.
    pub max_input_bytes: u64,
    /// Largest output raster, in pixels, for operations that can grow the
    /// image (resize, merge, free rotation). Checked from the source header.
    pub max_output_pixels: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_output_pixels: DEFAULT_MAX_OUTPUT_PIXELS,
        }
    }
}

/// Request defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Format token used when a request names none. Must be a registry token.
    pub format: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT_TOKEN.to_string(),
        }
    }
}

/// Geometry validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeometryConfig {
    /// Report invalid crop rectangles as errors instead of re-encoding the
    /// untouched source.
    pub strict_crop: bool,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EngineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Load config from `path` when given, stock defaults otherwise.
pub fn load_config_or_default(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => resolve_config(stock_defaults_value(), None),
    }
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgconv Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Limits
# ---------------------------------------------------------------------------
[limits]
# Largest accepted input, in bytes. Checked before any decoding happens,
# so oversized uploads never allocate a raster. Default: 5 MiB.
max_input_bytes = 5242880

# Largest raster, in pixels, that resize, merge or a free rotation may
# produce. Checked from the source header before any pixel work.
# Default: 50 megapixels.
max_output_pixels = 50000000

# ---------------------------------------------------------------------------
# Request defaults
# ---------------------------------------------------------------------------
[defaults]
# Target format when a request does not name one.
# Accepted (any case): jpg, jpeg, png, webp
format = "JPG"

# ---------------------------------------------------------------------------
# Geometry
# ---------------------------------------------------------------------------
[geometry]
# When false, a crop rectangle outside the image re-encodes the untouched
# source and reports it as skipped. When true, the request fails instead.
strict_crop = false
"##
}
