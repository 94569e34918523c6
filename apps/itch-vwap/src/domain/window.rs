//! Trading Windows
//!
//! Right-open, fixed-width windows over the trading session, indexed from
//! zero. The default schedule is hourly from 10:00 to 16:00 (six windows).
//! When the session is not a whole number of widths the last window is
//! shortened to end at the session close.

use chrono::{NaiveTime, Timelike};
use thiserror::Error;

use super::messages::Nanos;

// ============================================================================
// Constants
// ============================================================================

/// Nanoseconds in one second.
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Nanoseconds in one minute.
pub const NANOS_PER_MINUTE: u64 = 60 * NANOS_PER_SECOND;

/// Nanoseconds in one day.
pub const NANOS_PER_DAY: u64 = 24 * 60 * NANOS_PER_MINUTE;

/// Nanoseconds since midnight for a wall-clock time.
#[must_use]
pub const fn hms(hours: u64, minutes: u64, seconds: u64) -> Nanos {
    ((hours * 60 + minutes) * 60 + seconds) * NANOS_PER_SECOND
}

/// Nanoseconds since midnight for a `NaiveTime`.
#[must_use]
pub fn nanos_of_day(time: NaiveTime) -> Nanos {
    u64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND + u64::from(time.nanosecond())
}

/// Format nanoseconds since midnight as `HH:MM`.
#[must_use]
pub fn format_hhmm(nanos: Nanos) -> String {
    let seconds = u32::try_from(nanos / NANOS_PER_SECOND).unwrap_or(u32::MAX);
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).map_or_else(
        || {
            let minutes = nanos / NANOS_PER_MINUTE;
            format!("{:02}:{:02}", minutes / 60, minutes % 60)
        },
        |time| time.format("%H:%M").to_string(),
    )
}

// ============================================================================
// Types
// ============================================================================

/// Invalid window schedule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WindowError {
    /// Session start is not before session end.
    #[error("window start {start} must be before window end {end}", start = format_hhmm(*.start), end = format_hhmm(*.end))]
    EmptySession {
        /// Session start.
        start: Nanos,
        /// Session end.
        end: Nanos,
    },

    /// Window width is zero.
    #[error("window width must be greater than zero")]
    ZeroWidth,

    /// Session end lies past midnight.
    #[error("window end {end}ns is past the end of the day")]
    PastEndOfDay {
        /// Offending end.
        end: Nanos,
    },
}

/// Bounds of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    /// Zero-based window index.
    pub index: usize,
    /// Inclusive start.
    pub start: Nanos,
    /// Exclusive end.
    pub end: Nanos,
}

impl WindowBounds {
    /// Start as `HH:MM`.
    #[must_use]
    pub fn start_label(&self) -> String {
        format_hhmm(self.start)
    }

    /// End as `HH:MM`.
    #[must_use]
    pub fn end_label(&self) -> String {
        format_hhmm(self.end)
    }
}

/// The window schedule for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingWindows {
    start: Nanos,
    end: Nanos,
    width: Nanos,
    count: usize,
}

impl Default for TradingWindows {
    fn default() -> Self {
        Self {
            start: hms(10, 0, 0),
            end: hms(16, 0, 0),
            width: 60 * NANOS_PER_MINUTE,
            count: 6,
        }
    }
}

impl TradingWindows {
    /// Build a schedule of `width`-nanosecond windows covering `[start, end)`.
    pub fn new(start: Nanos, end: Nanos, width: Nanos) -> Result<Self, WindowError> {
        if width == 0 {
            return Err(WindowError::ZeroWidth);
        }
        if start >= end {
            return Err(WindowError::EmptySession { start, end });
        }
        if end > NANOS_PER_DAY {
            return Err(WindowError::PastEndOfDay { end });
        }
        let count = usize::try_from((end - start).div_ceil(width))
            .map_err(|_| WindowError::PastEndOfDay { end })?;
        Ok(Self {
            start,
            end,
            width,
            count,
        })
    }

    /// Build a schedule from wall-clock bounds and a width in minutes.
    pub fn from_times(
        start: NaiveTime,
        end: NaiveTime,
        width_minutes: u32,
    ) -> Result<Self, WindowError> {
        Self::new(
            nanos_of_day(start),
            nanos_of_day(end),
            u64::from(width_minutes) * NANOS_PER_MINUTE,
        )
    }

    /// Number of windows.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Session start.
    #[must_use]
    pub const fn start(&self) -> Nanos {
        self.start
    }

    /// Session end.
    #[must_use]
    pub const fn end(&self) -> Nanos {
        self.end
    }

    /// Index of the window containing `timestamp`, or `None` outside the session.
    #[must_use]
    pub fn index_of(&self, timestamp: Nanos) -> Option<usize> {
        if timestamp < self.start || timestamp >= self.end {
            return None;
        }
        usize::try_from((timestamp - self.start) / self.width).ok()
    }

    /// Bounds of window `index`.
    #[must_use]
    pub fn bounds(&self, index: usize) -> Option<WindowBounds> {
        if index >= self.count {
            return None;
        }
        let offset = u64::try_from(index).ok()?;
        let start = self.start + offset * self.width;
        let end = (start + self.width).min(self.end);
        Some(WindowBounds { index, start, end })
    }

    /// Every window in order.
    pub fn iter(&self) -> impl Iterator<Item = WindowBounds> + '_ {
        (0..self.count).filter_map(|index| self.bounds(index))
    }
}
