//! Tool configuration module.
//!
//! Handles loading, validating, and merging `pixkit.toml`. Stock defaults are
//! the base layer; a user file overrides only the keys it names. Command-line
//! flags override both (that last layer is applied by the CLI, not here).
//!
//! ## Config File Location
//!
//! `pixkit.toml` in the working directory is picked up automatically. Pass
//! `--config <path>` to use a different file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [compress]
//! format = "webp"           # webp | avif | jpeg | png
//! # quality = 80            # 1-100; omit to estimate per image
//!
//! [upscale]
//! scale = 2                 # 2 or 4
//! format = "png"            # jpg | png | webp
//! filter = "lanczos3"       # nearest | triangle | catmullrom | lanczos3
//! sharpen_sigma = 1.0       # 0 disables sharpening
//! sharpen_threshold = 0
//!
//! [background]
//! strategy = "radial"       # radial | blended
//!
//! [enhance]
//! tasks = ["upscale", "compress"]
//!
//! [logging]
//! level = "info"            # trace | debug | info | warn | error
//! format = "pretty"         # pretty | json
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The loaded [`ToolConfig`] is an immutable value handed to
//! [`Processor::new`](crate::processor::Processor::new); nothing reads
//! configuration from global state.

use crate::imaging::{OutputFormat, ResampleFilter, Sharpening, is_valid_scale};
use crate::mask::StrategyKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "pixkit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `pixkit.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Compression defaults (format, fixed quality).
    pub compress: CompressConfig,
    /// Upscaling defaults (factor, output format, kernel, sharpening).
    pub upscale: UpscaleConfig,
    /// Background removal settings.
    pub background: BackgroundConfig,
    /// Default task chain for `enhance`.
    pub enhance: EnhanceConfig,
    /// Log verbosity and format.
    pub logging: LoggingConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compress.quality.is_some_and(|q| !(1..=100).contains(&q)) {
            return Err(ConfigError::Validation(
                "compress.quality must be 1-100".into(),
            ));
        }
        if !is_valid_scale(self.upscale.scale) {
            return Err(ConfigError::Validation(
                "upscale.scale must be 2 or 4".into(),
            ));
        }
        if self.upscale.format == OutputFormat::Avif {
            return Err(ConfigError::Validation(
                "upscale.format must be jpg, png or webp".into(),
            ));
        }
        if !self.upscale.sharpen_sigma.is_finite() || self.upscale.sharpen_sigma < 0.0 {
            return Err(ConfigError::Validation(
                "upscale.sharpen_sigma must be a non-negative number".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Compression settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    /// Output format when none is given on the command line.
    pub format: OutputFormat,
    /// Fixed encoder quality. When absent, quality is estimated per image.
    pub quality: Option<u32>,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Webp,
            quality: None,
        }
    }
}

/// Upscaling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpscaleConfig {
    /// Scale factor, 2 or 4.
    pub scale: u32,
    /// Output format for upscaled images.
    pub format: OutputFormat,
    /// Resampling kernel.
    pub filter: ResampleFilter,
    /// Unsharp-mask sigma applied after resizing; 0 disables sharpening.
    pub sharpen_sigma: f32,
    /// Unsharp-mask threshold.
    pub sharpen_threshold: i32,
}

impl UpscaleConfig {
    pub fn sharpening(&self) -> Option<Sharpening> {
        (self.sharpen_sigma > 0.0).then_some(Sharpening {
            sigma: self.sharpen_sigma,
            threshold: self.sharpen_threshold,
        })
    }
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        let sharpening = Sharpening::upscale();
        Self {
            scale: 2,
            format: OutputFormat::Png,
            filter: ResampleFilter::Lanczos3,
            sharpen_sigma: sharpening.sigma,
            sharpen_threshold: sharpening.threshold,
        }
    }
}

/// Background removal settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    /// Mask strategy: `radial` (default) or `blended`.
    pub strategy: StrategyKind,
}

/// Enhance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnhanceConfig {
    /// Task names run in order when `--tasks` is not given.
    ///
    /// Names are resolved when each task is reached, not at load time.
    pub tasks: Vec<String>,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            tasks: vec!["upscale".to_string(), "compress".to_string()],
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from an explicit file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<ToolConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Load `pixkit.toml` from `dir`, falling back to stock defaults when absent.
pub fn load_config(dir: &Path) -> Result<ToolConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return resolve_config(None);
    }
    load_config_file(&path)
}

/// Returns a fully-commented stock `pixkit.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pixkit configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# pixkit reads ./pixkit.toml automatically; use --config <path> for another file.
# Command-line flags always win over values set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Compression
# ---------------------------------------------------------------------------
[compress]
# Output format: webp, avif, jpeg or png.
format = "webp"

# Fixed encoder quality (1-100). Leave unset to let pixkit estimate a
# quality per image from its colour spread, entropy and file size.
# quality = 80

# ---------------------------------------------------------------------------
# Upscaling
# ---------------------------------------------------------------------------
[upscale]
# Scale factor: 2 or 4.
scale = 2

# Output format: jpg, png or webp.
format = "png"

# Resampling kernel: nearest, triangle, catmullrom or lanczos3.
filter = "lanczos3"

# Unsharp mask applied after resizing. Set sharpen_sigma = 0 to disable.
sharpen_sigma = 1.0
sharpen_threshold = 0

# ---------------------------------------------------------------------------
# Background removal
# ---------------------------------------------------------------------------
[background]
# Mask strategy:
#   radial  - soft disc around the image centre (default)
#   blended - edge map + centre ellipse + border falloff
strategy = "radial"

# ---------------------------------------------------------------------------
# Enhance
# ---------------------------------------------------------------------------
[enhance]
# Tasks run in order when --tasks is not given.
# Available: remove-bg, upscale, compress
tasks = ["upscale", "compress"]

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# trace, debug, info, warn or error. RUST_LOG overrides this.
level = "info"

# pretty or json. Logs always go to stderr.
format = "pretty"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ToolConfig::default();
        assert_eq!(config.compress.format, OutputFormat::Webp);
        assert_eq!(config.compress.quality, None);
        assert_eq!(config.upscale.scale, 2);
        assert_eq!(config.upscale.format, OutputFormat::Png);
        assert_eq!(config.background.strategy, StrategyKind::Radial);
        assert_eq!(config.enhance.tasks, vec!["upscale", "compress"]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[compress]
format = "avif"
"#;
        let config: ToolConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.compress.format, OutputFormat::Avif);
        // Defaults preserved
        assert_eq!(config.compress.quality, None);
        assert_eq!(config.upscale.scale, 2);
    }

    #[test]
    fn default_sharpening_enabled() {
        let s = UpscaleConfig::default().sharpening().unwrap();
        assert_eq!(s, Sharpening::upscale());
    }

    #[test]
    fn zero_sigma_disables_sharpening() {
        let config = UpscaleConfig {
            sharpen_sigma: 0.0,
            ..UpscaleConfig::default()
        };
        assert!(config.sharpening().is_none());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
[compress]
quality = 70

[upscale]
scale = 4
filter = "catmullrom"

[background]
strategy = "blended"

[enhance]
tasks = ["remove-bg", "compress"]
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.compress.quality, Some(70));
        assert_eq!(config.upscale.scale, 4);
        assert_eq!(config.upscale.filter, ResampleFilter::CatmullRom);
        assert_eq!(config.background.strategy, StrategyKind::Blended);
        assert_eq!(config.enhance.tasks, vec!["remove-bg", "compress"]);
        // Unspecified values should be defaults
        assert_eq!(config.compress.format, OutputFormat::Webp);
        assert_eq!(config.upscale.format, OutputFormat::Png);
    }

    #[test]
    fn load_config_file_missing_is_io_error() {
        let result = load_config_file(Path::new("/nonexistent/pixkit.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // merge tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[upscale]\nscale = 4").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["upscale"]["scale"].as_integer(), Some(4));
        assert_eq!(merged["upscale"]["format"].as_str(), Some("png"));
        assert_eq!(merged["compress"]["format"].as_str(), Some("webp"));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[enhance]\ntasks = [\"remove-bg\"]").unwrap();
        let merged = merge_toml(base, overlay);
        let tasks = merged["enhance"]["tasks"].as_array().unwrap();
        assert_eq!(tasks.len(), 1);
    }

    // =========================================================================
    // validation tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result = resolve_config(Some(toml::from_str("[compress]\nspeed = 3").unwrap()));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_section_rejected() {
        let result = resolve_config(Some(toml::from_str("[models]\npath = \"x\"").unwrap()));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_format_rejected() {
        let result = resolve_config(Some(toml::from_str("[compress]\nformat = \"gif\"").unwrap()));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn validate_quality_range() {
        for (q, ok) in [(0, false), (1, true), (100, true), (101, false)] {
            let overlay = toml::from_str(&format!("[compress]\nquality = {q}")).unwrap();
            assert_eq!(resolve_config(Some(overlay)).is_ok(), ok, "quality {q}");
        }
    }

    #[test]
    fn validate_scale() {
        let overlay = toml::from_str("[upscale]\nscale = 3").unwrap();
        let err = resolve_config(Some(overlay)).unwrap_err();
        assert!(err.to_string().contains("2 or 4"));
    }

    #[test]
    fn validate_upscale_format() {
        let overlay = toml::from_str("[upscale]\nformat = \"avif\"").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_negative_sigma() {
        let overlay = toml::from_str("[upscale]\nsharpen_sigma = -1.0").unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    #[test]
    fn validate_log_level() {
        let overlay = toml::from_str("[logging]\nlevel = \"loud\"").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_default_config_passes() {
        ToolConfig::default().validate().unwrap();
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(Some(value)).unwrap();
        assert_eq!(config, ToolConfig::default());
    }
}
