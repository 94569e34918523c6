//! Executed Trades
//!
//! Narrows the decoded stream to events that represent executed volume at a
//! known price. Order executions are priced by the resolver; `P` and `Q`
//! prints carry their own price and pass straight through. Zero-share
//! executions are dropped whatever their source.

use super::messages::{ItchMessage, Nanos, Price, Symbol};

/// Which message kind produced a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeSource {
    /// `E`, priced from the resting order.
    OrderExecuted,
    /// `C`, priced inline.
    OrderExecutedWithPrice,
    /// `P`, execution against a non-displayed order.
    NonCross,
    /// `Q`, auction cross.
    Cross,
}

impl TradeSource {
    /// All sources, in report order.
    pub const ALL: [Self; 4] = [
        Self::OrderExecuted,
        Self::OrderExecutedWithPrice,
        Self::NonCross,
        Self::Cross,
    ];

    /// Label used in metrics and the run report.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderExecuted => "order_executed",
            Self::OrderExecutedWithPrice => "order_executed_with_price",
            Self::NonCross => "non_cross",
            Self::Cross => "cross",
        }
    }
}

/// One execution contributing to VWAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutedTrade {
    /// Security symbol.
    pub stock: Symbol,
    /// Execution price.
    pub price: Price,
    /// Executed shares.
    pub shares: u64,
    /// Nanoseconds since midnight.
    pub timestamp: Nanos,
    /// Originating message kind.
    pub source: TradeSource,
}

impl ExecutedTrade {
    /// Exact notional in price ticks (price × shares × 10^4).
    #[must_use]
    pub fn notional(&self) -> u128 {
        u128::from(self.price.raw()) * u128::from(self.shares)
    }
}

/// Picks executed volume out of the message stream.
#[derive(Debug, Clone, Copy)]
pub struct TradeExtractor {
    include_cross_trades: bool,
}

impl Default for TradeExtractor {
    fn default() -> Self {
        Self {
            include_cross_trades: true,
        }
    }
}

impl TradeExtractor {
    /// Create an extractor that counts cross trades.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Include or exclude `Q` cross prints.
    #[must_use]
    pub const fn with_cross_trades(mut self, include: bool) -> Self {
        self.include_cross_trades = include;
        self
    }

    /// Combine a message with the resolver's output into at most one trade.
    ///
    /// `resolved` is whatever the order resolver produced for the same
    /// message; it is forwarded for every type other than `P`/`Q`.
    #[must_use]
    pub fn extract(
        &self,
        message: &ItchMessage,
        resolved: Option<ExecutedTrade>,
    ) -> Option<ExecutedTrade> {
        let trade = match message {
            ItchMessage::Trade(trade) => Some(ExecutedTrade {
                stock: trade.stock,
                price: trade.price,
                shares: u64::from(trade.shares),
                timestamp: trade.header.timestamp,
                source: TradeSource::NonCross,
            }),
            ItchMessage::CrossTrade(cross) => {
                if !self.include_cross_trades {
                    return None;
                }
                Some(ExecutedTrade {
                    stock: cross.stock,
                    price: cross.cross_price,
                    shares: cross.shares,
                    timestamp: cross.header.timestamp,
                    source: TradeSource::Cross,
                })
            }
            _ => resolved,
        };
        trade.filter(|trade| trade.shares > 0)
    }
}
