//! Configuration module.
//!
//! Handles loading, validating, and merging `boletim.toml`. Stock defaults
//! are serialized to a TOML table and the user file is merged on top, so the
//! file only needs the keys it overrides.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [store]
//! snapshot = "boletim-data.json"  # JSON file the CLI loads and saves
//!
//! [images]
//! compress = true           # Downscale + re-encode as JPEG before storage
//! max_width = 800           # Bounds for downscaling, in pixels
//! max_height = 600
//! quality = 0.8             # JPEG quality as a fraction in (0, 1]
//! max_upload_bytes = 5242880  # Largest accepted source file (5 MB)
//!
//! [dashboard]
//! recent_limit = 10         # Entries in the recent-activity feed
//! ```
//!
//! ## Partial Configuration
//!
//! ```toml
//! # Only keep uploads as-is
//! [images]
//! compress = false
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "boletim.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `boletim.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoletimConfig {
    /// Where the CLI keeps the store between runs.
    pub store: StoreConfig,
    /// Upload checks and image encoding.
    pub images: ImagesConfig,
    /// Editor dashboard settings.
    pub dashboard: DashboardConfig,
}

impl BoletimConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let quality = self.images.quality;
        if !(quality > 0.0 && quality <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "images.quality must be in (0, 1], got {quality}"
            )));
        }
        if self.images.max_width == 0 || self.images.max_height == 0 {
            return Err(ConfigError::Validation(
                "images.max_width and images.max_height must be non-zero".into(),
            ));
        }
        if self.images.max_upload_bytes == 0 {
            return Err(ConfigError::Validation(
                "images.max_upload_bytes must be non-zero".into(),
            ));
        }
        if self.store.snapshot.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "store.snapshot must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// JSON snapshot of the whole store tree.
    pub snapshot: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from("boletim-data.json"),
        }
    }
}

/// Upload and encoding settings for the `imagem` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Downscale and re-encode as JPEG; when false the file is stored as-is.
    pub compress: bool,
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality as a fraction in (0, 1].
    pub quality: f32,
    /// Largest accepted source file, in bytes.
    pub max_upload_bytes: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            compress: true,
            max_width: 800,
            max_height: 600,
            quality: 0.8,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Maximum entries in the recent-activity feed.
    pub recent_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { recent_limit: 10 }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BoletimConfig::default())?)
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BoletimConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BoletimConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<BoletimConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Returns a fully-commented stock `boletim.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Boletim Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Store
# ---------------------------------------------------------------------------
[store]
# JSON file holding the whole document tree. Created on first write.
snapshot = "boletim-data.json"

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# Downscale and re-encode uploads as JPEG before storing them inline.
# When false, the file bytes are stored unchanged.
compress = true

# Bounds for downscaling, in pixels. Images are never upscaled.
max_width = 800
max_height = 600

# JPEG quality as a fraction: 0.8 means 80%. Must be in (0, 1].
quality = 0.8

# Largest accepted source file, in bytes (5 MB).
max_upload_bytes = 5242880

# ---------------------------------------------------------------------------
# Dashboard
# ---------------------------------------------------------------------------
[dashboard]
# Maximum entries in the recent-activity feed.
recent_limit = 10
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = BoletimConfig::default();
        assert!(config.images.compress);
        assert_eq!(config.images.max_width, 800);
        assert_eq!(config.images.max_height, 600);
        assert_eq!(config.images.quality, 0.8);
        assert_eq!(config.images.max_upload_bytes, 5_242_880);
        assert_eq!(config.dashboard.recent_limit, 10);
        assert_eq!(config.store.snapshot, PathBuf::from("boletim-data.json"));
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[images]
compress = false
"#;
        let config: BoletimConfig = toml::from_str(toml).unwrap();
        // Overridden value
        assert!(!config.images.compress);
        // Default values preserved
        assert_eq!(config.images.max_width, 800);
        assert_eq!(config.dashboard.recent_limit, 10);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r#"
[images]
qualty = 0.5
"#;
        assert!(toml::from_str::<BoletimConfig>(toml).is_err());
        assert!(toml::from_str::<BoletimConfig>("colors = 1").is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn default_config_validates() {
        BoletimConfig::default().validate().unwrap();
    }

    #[test]
    fn quality_out_of_range_rejected() {
        for quality in [0.0, -0.5, 1.5, f32::NAN] {
            let mut config = BoletimConfig::default();
            config.images.quality = quality;
            assert!(config.validate().is_err(), "quality {quality} accepted");
        }
        let mut config = BoletimConfig::default();
        config.images.quality = 1.0;
        config.validate().unwrap();
    }

    #[test]
    fn zero_bounds_rejected() {
        let mut config = BoletimConfig::default();
        config.images.max_height = 0;
        assert!(config.validate().is_err());

        let mut config = BoletimConfig::default();
        config.images.max_upload_bytes = 0;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Merging and loading
    // =========================================================================

    #[test]
    fn merge_overrides_leaf_and_keeps_siblings() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[images]\nmax_width = 1024").unwrap();
        let merged = merge_toml(base, overlay);
        let config: BoletimConfig = merged.try_into().unwrap();
        assert_eq!(config.images.max_width, 1024);
        assert_eq!(config.images.max_height, 600);
    }

    #[test]
    fn load_config_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, BoletimConfig::default());
    }

    #[test]
    fn load_config_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "[dashboard]\nrecent_limit = 3\n[store]\nsnapshot = \"x.json\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.dashboard.recent_limit, 3);
        assert_eq!(config.store.snapshot, PathBuf::from("x.json"));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "[images\ncompress = ").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_invalid_value_is_validation_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "[images]\nquality = 2.0\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: BoletimConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, BoletimConfig::default());
    }
}
