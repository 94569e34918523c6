//! Configuration sections. Every key has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};

use crate::domain::vwap::{DEFAULT_PRICE_DECIMALS, OutputMode};
use crate::infrastructure::input::DEFAULT_BUFFER_BYTES;

/// Trading window schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowsConfig {
    /// Session start, `HH:MM` or `HH:MM:SS`.
    #[serde(default = "default_window_start")]
    pub start: String,
    /// Session end (exclusive), `HH:MM` or `HH:MM:SS`.
    #[serde(default = "default_window_end")]
    pub end: String,
    /// Window width in minutes.
    #[serde(default = "default_width_minutes")]
    pub width_minutes: u32,
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            start: default_window_start(),
            end: default_window_end(),
            width_minutes: default_width_minutes(),
        }
    }
}

fn default_window_start() -> String {
    "10:00".to_string()
}

fn default_window_end() -> String {
    "16:00".to_string()
}

const fn default_width_minutes() -> u32 {
    60
}

/// Which executions count toward volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradesConfig {
    /// Count `Q` cross prints.
    #[serde(default = "default_true")]
    pub include_cross_trades: bool,
    /// Count `C` executions flagged non-printable.
    #[serde(default)]
    pub count_non_printable: bool,
}

impl Default for TradesConfig {
    fn default() -> Self {
        Self {
            include_cross_trades: true,
            count_non_printable: false,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// CSV output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// `window` or `running`.
    #[serde(default)]
    pub mode: OutputMode,
    /// Decimals in the `vwap` column.
    #[serde(default = "default_price_decimals")]
    pub price_decimals: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Window,
            price_decimals: default_price_decimals(),
        }
    }
}

const fn default_price_decimals() -> u32 {
    DEFAULT_PRICE_DECIMALS
}

/// Processing knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Bytes between progress log lines.
    #[serde(default = "default_progress_interval_bytes")]
    pub progress_interval_bytes: u64,
    /// Read buffer capacity in bytes.
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            progress_interval_bytes: default_progress_interval_bytes(),
            read_buffer_bytes: default_read_buffer_bytes(),
        }
    }
}

const fn default_progress_interval_bytes() -> u64 {
    100 * 1024 * 1024
}

const fn default_read_buffer_bytes() -> usize {
    DEFAULT_BUFFER_BYTES
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
