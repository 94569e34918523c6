//! Window Aggregation
//!
//! Accumulates notional and share volume per (security, window). Sums are
//! exact integers in price ticks so VWAP is computed once, at the end, from
//! unrounded totals.

use std::collections::HashMap;

use super::messages::Symbol;
use super::trade::ExecutedTrade;
use super::window::TradingWindows;

/// Running totals for one (security, window).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationCell {
    /// Σ price × shares, in ticks of 1/10_000.
    pub notional: u128,
    /// Σ shares.
    pub volume: u64,
}

impl AggregationCell {
    /// Add one trade's contribution.
    pub fn add(&mut self, notional: u128, shares: u64) {
        self.notional = self.notional.saturating_add(notional);
        self.volume = self.volume.saturating_add(shares);
    }
}

/// Where an absorbed trade ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absorbed {
    /// Added to the cell for this window index.
    Window(usize),
    /// Timestamp outside the session; discarded.
    OutsideSession,
}

/// Owns the cell table for one run.
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    windows: TradingWindows,
    cells: HashMap<(Symbol, usize), AggregationCell>,
}

impl WindowAggregator {
    /// Create an empty aggregator over the given schedule.
    #[must_use]
    pub fn new(windows: TradingWindows) -> Self {
        Self {
            windows,
            cells: HashMap::new(),
        }
    }

    /// Window schedule.
    #[must_use]
    pub const fn windows(&self) -> &TradingWindows {
        &self.windows
    }

    /// Add a trade to its (security, window) cell.
    pub fn absorb(&mut self, trade: &ExecutedTrade) -> Absorbed {
        let Some(index) = self.windows.index_of(trade.timestamp) else {
            return Absorbed::OutsideSession;
        };
        self.cells
            .entry((trade.stock, index))
            .or_default()
            .add(trade.notional(), trade.shares);
        Absorbed::Window(index)
    }

    /// Cell for a security and window, if any trade landed there.
    #[must_use]
    pub fn cell(&self, stock: Symbol, index: usize) -> Option<&AggregationCell> {
        self.cells.get(&(stock, index))
    }

    /// Number of populated cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of distinct securities with at least one cell.
    #[must_use]
    pub fn security_count(&self) -> usize {
        let mut symbols: Vec<Symbol> = self.cells.keys().map(|(symbol, _)| *symbol).collect();
        symbols.sort_unstable();
        symbols.dedup();
        symbols.len()
    }

    /// Cells ordered by security, then window index.
    #[must_use]
    pub fn sorted_cells(&self) -> Vec<(Symbol, usize, AggregationCell)> {
        let mut cells: Vec<_> = self
            .cells
            .iter()
            .map(|(&(symbol, index), cell)| (symbol, index, *cell))
            .collect();
        cells.sort_unstable_by_key(|(symbol, index, _)| (*symbol, *index));
        cells
    }
}
