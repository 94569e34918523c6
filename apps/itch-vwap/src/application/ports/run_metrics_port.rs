//! Run Metrics Port (Driven Port)
//!
//! Interface for reporting pipeline progress to a metrics backend.

use crate::domain::trade::TradeSource;

/// Reasons a message is skipped without aborting the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Tag outside the supported set.
    UnknownMessageType,
    /// Enumerated or symbol byte out of range in a correctly sized frame.
    InvalidField,
    /// Reference with no live order.
    UnknownOrderReference,
    /// Reference already live.
    DuplicateOrderReference,
    /// Execution or cancel larger than the resting quantity.
    SharesExceedRemaining,
    /// `C` execution flagged non-printable.
    NonPrintable,
}

impl SkipReason {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownMessageType => "unknown_message_type",
            Self::InvalidField => "invalid_field",
            Self::UnknownOrderReference => "unknown_order_reference",
            Self::DuplicateOrderReference => "duplicate_order_reference",
            Self::SharesExceedRemaining => "shares_exceed_remaining",
            Self::NonPrintable => "non_printable",
        }
    }
}

/// Port for run counters.
pub trait RunMetricsPort {
    /// One frame of `bytes` length, prefix included.
    fn record_frame(&self, bytes: usize);

    /// A message decoded with this tag.
    fn record_message_decoded(&self, tag: u8);

    /// A message skipped without aborting the run.
    fn record_skip(&self, reason: SkipReason);

    /// A trade that reached a window.
    fn record_trade(&self, source: TradeSource);

    /// A trade outside the session.
    fn record_trade_outside_windows(&self);
}

/// Metrics sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRunMetrics;

impl RunMetricsPort for NoOpRunMetrics {
    fn record_frame(&self, _bytes: usize) {}

    fn record_message_decoded(&self, _tag: u8) {}

    fn record_skip(&self, _reason: SkipReason) {}

    fn record_trade(&self, _source: TradeSource) {}

    fn record_trade_outside_windows(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_reason_labels() {
        assert_eq!(
            SkipReason::UnknownMessageType.as_str(),
            "unknown_message_type"
        );
        assert_eq!(SkipReason::InvalidField.as_str(), "invalid_field");
        assert_eq!(
            SkipReason::UnknownOrderReference.as_str(),
            "unknown_order_reference"
        );
        assert_eq!(
            SkipReason::DuplicateOrderReference.as_str(),
            "duplicate_order_reference"
        );
        assert_eq!(
            SkipReason::SharesExceedRemaining.as_str(),
            "shares_exceed_remaining"
        );
        assert_eq!(SkipReason::NonPrintable.as_str(), "non_printable");
    }
}
