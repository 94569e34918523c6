//! VWAP Emission
//!
//! Turns the aggregated cells into ordered VWAP rows. Division happens once
//! per row in `rust_decimal`, then the result is rounded half away from zero
//! and rescaled so it always prints with the configured number of decimals.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::aggregation::{AggregationCell, WindowAggregator};
use super::messages::{PRICE_SCALE, Symbol};
use super::window::WindowBounds;

/// Default number of decimals in emitted VWAP values.
pub const DEFAULT_PRICE_DECIMALS: u32 = 4;

/// Largest supported number of VWAP decimals.
pub const MAX_PRICE_DECIMALS: u32 = 10;

/// How each row's totals are scoped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Each row covers its own window only.
    #[default]
    Window,
    /// Each row is cumulative for its security up to and including its window.
    Running,
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VwapRow {
    /// Security symbol.
    pub symbol: Symbol,
    /// Window the row belongs to.
    pub window: WindowBounds,
    /// Volume-weighted average price, rescaled to the output precision.
    pub vwap: Decimal,
    /// Shares behind the VWAP.
    pub volume: u64,
}

/// Failure while computing VWAP.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmitError {
    /// Notional too large for decimal arithmetic.
    #[error("notional {notional} for {symbol} at {window_start} is not representable as a decimal")]
    NotionalOverflow {
        /// Security symbol.
        symbol: String,
        /// Window start as `HH:MM`.
        window_start: String,
        /// Raw notional in ticks.
        notional: u128,
    },
}

/// Compute `notional / volume` in price units, rounded to `decimals`.
///
/// `notional` is in ticks of 1/10_000. Returns `None` for zero volume or
/// when the notional exceeds decimal range.
#[must_use]
pub fn vwap(notional: u128, volume: u64, decimals: u32) -> Option<Decimal> {
    if volume == 0 {
        return None;
    }
    let notional = i128::try_from(notional).ok()?;
    let notional = Decimal::try_from_i128_with_scale(notional, PRICE_SCALE).ok()?;
    let mut value = notional
        .checked_div(Decimal::from(volume))?
        .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(decimals);
    Some(value)
}

/// Builds ordered rows from a finished aggregation.
#[derive(Debug, Clone, Copy)]
pub struct VwapEmitter {
    mode: OutputMode,
    price_decimals: u32,
}

impl Default for VwapEmitter {
    fn default() -> Self {
        Self {
            mode: OutputMode::Window,
            price_decimals: DEFAULT_PRICE_DECIMALS,
        }
    }
}

impl VwapEmitter {
    /// Per-window emitter with four decimals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select window or running totals.
    #[must_use]
    pub const fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set output precision, capped at [`MAX_PRICE_DECIMALS`].
    #[must_use]
    pub fn with_price_decimals(mut self, decimals: u32) -> Self {
        self.price_decimals = decimals.min(MAX_PRICE_DECIMALS);
        self
    }

    /// Output mode.
    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    /// One row per non-empty cell, ordered by symbol then window start.
    pub fn finalize(&self, aggregator: &WindowAggregator) -> Result<Vec<VwapRow>, EmitError> {
        let windows = aggregator.windows();
        let mut rows = Vec::with_capacity(aggregator.cell_count());
        let mut running: Option<(Symbol, AggregationCell)> = None;

        for (symbol, index, cell) in aggregator.sorted_cells() {
            if cell.volume == 0 {
                continue;
            }
            let Some(window) = windows.bounds(index) else {
                continue;
            };

            let totals = match self.mode {
                OutputMode::Window => cell,
                OutputMode::Running => {
                    let mut cumulative = match running {
                        Some((previous, totals)) if previous == symbol => totals,
                        _ => AggregationCell::default(),
                    };
                    cumulative.add(cell.notional, cell.volume);
                    running = Some((symbol, cumulative));
                    cumulative
                }
            };

            let value = vwap(totals.notional, totals.volume, self.price_decimals).ok_or_else(
                || EmitError::NotionalOverflow {
                    symbol: symbol.to_string(),
                    window_start: window.start_label(),
                    notional: totals.notional,
                },
            )?;

            rows.push(VwapRow {
                symbol,
                window,
                vwap: value,
                volume: totals.volume,
            });
        }

        Ok(rows)
    }
}
