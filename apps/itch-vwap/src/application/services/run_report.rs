//! Run Report
//!
//! Counters describing one pass over a day file. Serialized as JSON for
//! `--report` and summarized in the final log line.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::domain::messages::Nanos;
use crate::domain::window::NANOS_PER_SECOND;

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Frames read.
    pub frames: u64,
    /// Bytes consumed, length prefixes included.
    pub bytes: u64,
    /// Messages decoded into a supported type.
    pub messages_decoded: u64,
    /// Decoded messages per tag.
    pub messages_by_type: BTreeMap<String, u64>,
    /// Skipped frames per unsupported tag.
    pub unknown_message_types: BTreeMap<String, u64>,
    /// Skipped frames with an out-of-range field byte, keyed `<tag>.<field>`.
    pub invalid_fields: BTreeMap<String, u64>,
    /// Messages naming a reference with no live order.
    pub unknown_order_references: u64,
    /// Adds or replaces naming an already-live reference.
    pub duplicate_order_references: u64,
    /// Executions or cancels larger than the resting quantity.
    pub shares_exceed_remaining: u64,
    /// `C` executions excluded as non-printable.
    pub non_printable_executions: u64,
    /// Broken trade notices seen.
    pub broken_trades: u64,
    /// Trades aggregated per source.
    pub trades_by_source: BTreeMap<String, u64>,
    /// Trades discarded for falling outside the session.
    pub trades_outside_windows: u64,
    /// Distinct securities in Stock Directory messages.
    pub securities_listed: u64,
    /// Distinct securities with at least one aggregated trade.
    pub securities_traded: u64,
    /// Live orders left when the input ended.
    pub live_orders_at_end: u64,
    /// Rows emitted.
    pub rows_emitted: u64,
    /// Start of market hours (`S`/`Q`), nanoseconds since midnight.
    pub market_open_ns: Option<Nanos>,
    /// End of market hours (`S`/`M`), nanoseconds since midnight.
    pub market_close_ns: Option<Nanos>,
}

impl RunReport {
    /// Total trades aggregated.
    #[must_use]
    pub fn trades(&self) -> u64 {
        self.trades_by_source.values().sum()
    }

    /// Total messages skipped for any recoverable reason.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.unknown_message_types.values().sum::<u64>()
            + self.invalid_fields.values().sum::<u64>()
            + self.unknown_order_references
            + self.duplicate_order_references
            + self.shares_exceed_remaining
    }

    /// Market open as `HH:MM:SS.nnnnnnnnn`.
    #[must_use]
    pub fn market_open(&self) -> Option<String> {
        self.market_open_ns.map(format_timestamp)
    }

    /// Market close as `HH:MM:SS.nnnnnnnnn`.
    #[must_use]
    pub fn market_close(&self) -> Option<String> {
        self.market_close_ns.map(format_timestamp)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Label for a tag byte in report maps.
pub(crate) fn tag_label(tag: u8) -> String {
    char::from(tag).escape_default().to_string()
}

/// Format nanoseconds since midnight with full precision.
#[must_use]
pub fn format_timestamp(nanos: Nanos) -> String {
    let seconds = u32::try_from(nanos / NANOS_PER_SECOND).unwrap_or(u32::MAX);
    let subsec = (nanos % NANOS_PER_SECOND) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, subsec).map_or_else(
        || format!("{nanos}ns"),
        |time| time.format("%H:%M:%S%.9f").to_string(),
    )
}
