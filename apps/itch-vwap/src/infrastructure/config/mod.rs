//! Configuration module for the VWAP extractor.
//!
//! Loads an optional YAML file with environment variable interpolation and
//! validates it. Every key has a default, so running without a file gives
//! hourly windows from 10:00 to 16:00 with four-decimal VWAP.
//!
//! # Usage
//!
//! ```rust,ignore
//! use itch_vwap::infrastructure::config::load_config;
//!
//! let config = load_config(Some("vwap.yaml"))?;
//! let windows = config.trading_windows()?;
//! ```
//!
//! # Example
//!
//! ```yaml
//! windows:
//!   start: "09:30"
//!   end: "16:00"
//!   width_minutes: 30
//! trades:
//!   include_cross_trades: ${VWAP_INCLUDE_CROSS:-true}
//! output:
//!   mode: running
//!   price_decimals: 6
//! ```

mod sections;

use std::sync::OnceLock;

use chrono::NaiveTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sections::{LoggingConfig, OutputConfig, ProcessingConfig, TradesConfig, WindowsConfig};

use crate::domain::vwap::MAX_PRICE_DECIMALS;
use crate::domain::window::TradingWindows;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VwapConfig {
    /// Window schedule.
    #[serde(default)]
    pub windows: WindowsConfig,
    /// Trade inclusion rules.
    #[serde(default)]
    pub trades: TradesConfig,
    /// CSV output.
    #[serde(default)]
    pub output: OutputConfig,
    /// Processing knobs.
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VwapConfig {
    /// Window schedule described by `windows.*`.
    pub fn trading_windows(&self) -> Result<TradingWindows, ConfigError> {
        let start = parse_time("windows.start", &self.windows.start)?;
        let end = parse_time("windows.end", &self.windows.end)?;
        TradingWindows::from_times(start, end, self.windows.width_minutes)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file, or defaults when `path` is `None`.
pub fn load_config(path: Option<&str>) -> Result<VwapConfig, ConfigError> {
    let Some(path) = path else {
        let config = VwapConfig::default();
        validate_config(&config)?;
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
pub fn load_config_from_string(yaml: &str) -> Result<VwapConfig, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    // An empty or comment-only document means "all defaults".
    let config: VwapConfig = if interpolated.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    }) {
        VwapConfig::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
fn interpolate_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

    let Some(re) = ENV_VAR_REGEX
        .get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").ok())
    else {
        return input.to_string();
    };

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let var_name = cap.get(1).map_or("", |m| m.as_str());
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(var_name) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

fn parse_time(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| {
            ConfigError::ValidationError(format!("{key} must be HH:MM or HH:MM:SS, got '{value}'"))
        })
}

/// Validate configuration values.
fn validate_config(config: &VwapConfig) -> Result<(), ConfigError> {
    if config.windows.width_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "windows.width_minutes must be greater than zero".to_string(),
        ));
    }

    // Also checks start < end.
    config.trading_windows()?;

    if config.output.price_decimals > MAX_PRICE_DECIMALS {
        return Err(ConfigError::ValidationError(format!(
            "output.price_decimals must be at most {MAX_PRICE_DECIMALS}"
        )));
    }

    if config.processing.progress_interval_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "processing.progress_interval_bytes must be positive".to_string(),
        ));
    }

    if config.processing.read_buffer_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "processing.read_buffer_bytes must be positive".to_string(),
        ));
    }

    let valid_formats = ["pretty", "json"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "logging.format must be one of: {valid_formats:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vwap::OutputMode;
    use crate::domain::window::hms;

    #[test]
    fn test_default_config() {
        let config = load_config(None).unwrap();

        assert_eq!(config.windows.start, "10:00");
        assert_eq!(config.windows.end, "16:00");
        assert_eq!(config.windows.width_minutes, 60);
        assert!(config.trades.include_cross_trades);
        assert!(!config.trades.count_non_printable);
        assert_eq!(config.output.mode, OutputMode::Window);
        assert_eq!(config.output.price_decimals, 4);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.trading_windows().unwrap(), TradingWindows::default());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = load_config_from_string("# nothing here\n").unwrap();
        assert_eq!(config, VwapConfig::default());
    }

    #[test]
    fn test_load_partial_config() {
        let yaml = r#"
windows:
  start: "09:30"
  width_minutes: 30
output:
  mode: running
"#;

        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load partial config: {e}"),
        };
        let windows = config.trading_windows().unwrap();

        assert_eq!(windows.start(), hms(9, 30, 0));
        assert_eq!(windows.count(), 13);
        assert_eq!(config.output.mode, OutputMode::Running);
        assert_eq!(config.output.price_decimals, 4);
    }

    #[test]
    fn test_times_accept_seconds() {
        let yaml = "windows:\n  start: \"10:00:30\"\n";
        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.trading_windows().unwrap().start(), hms(10, 0, 30));
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "mode: ${ITCH_VWAP_CONFIG_TEST_NONEXISTENT_VAR:-running}";
        assert_eq!(interpolate_env_vars(input), "mode: running");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);

        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "level: ${ITCH_VWAP_CONFIG_TEST_UNLIKELY_TO_EXIST}";
        assert_eq!(interpolate_env_vars(input), "level: ");
    }

    #[test]
    fn test_interpolated_yaml_parses() {
        let yaml = "output:\n  price_decimals: ${ITCH_VWAP_CONFIG_TEST_DECIMALS:-6}\n";
        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.output.price_decimals, 6);
    }

    #[test]
    fn test_validation_start_after_end() {
        let yaml = "windows:\n  start: \"16:00\"\n  end: \"10:00\"\n";

        let err = load_config_from_string(yaml).unwrap_err();

        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("must be before"));
    }

    #[test]
    fn test_validation_zero_width() {
        let yaml = "windows:\n  width_minutes: 0\n";
        assert!(matches!(
            load_config_from_string(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_bad_time() {
        let yaml = "windows:\n  start: \"ten o'clock\"\n";
        let err = load_config_from_string(yaml).unwrap_err();
        assert!(err.to_string().contains("windows.start"));
    }

    #[test]
    fn test_validation_too_many_decimals() {
        let yaml = "output:\n  price_decimals: 11\n";
        assert!(matches!(
            load_config_from_string(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_zero_progress_interval() {
        let yaml = "processing:\n  progress_interval_bytes: 0\n";
        assert!(matches!(
            load_config_from_string(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_unknown_log_format() {
        let yaml = "logging:\n  format: xml\n";
        assert!(matches!(
            load_config_from_string(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_invalid_output_mode_is_parse_error() {
        let yaml = "output:\n  mode: hourly\n";
        assert!(matches!(
            load_config_from_string(yaml),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_config(Some("/nonexistent/itch-vwap.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
