//! Live Order Resolution
//!
//! ITCH `E` executions carry only an order reference and a share count. To
//! price them the resolver keeps every resting order the feed has added and
//! not yet fully removed, keyed by reference. Only the fields needed to
//! price an execution are kept; this is not a display book.

use std::collections::HashMap;

use thiserror::Error;

use super::messages::{
    AddOrder, ItchMessage, OrderCancel, OrderDelete, OrderExecuted, OrderExecutedWithPrice,
    OrderRef, OrderReplace, Price, Side, Symbol,
};
use super::trade::{ExecutedTrade, TradeSource};

/// A resting order as far as VWAP resolution is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveOrder {
    /// Security symbol.
    pub stock: Symbol,
    /// Buy or sell.
    pub side: Side,
    /// Limit price, used to price `E` executions.
    pub price: Price,
    /// Shares still resting on the book.
    pub remaining_shares: u32,
}

/// Recoverable order-state inconsistencies.
///
/// Each error leaves the resolver untouched; the caller skips the message.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Message names a reference with no live order.
    #[error("unknown order reference {order_ref} in '{kind}' message", kind = char::from(*.tag))]
    UnknownOrderReference {
        /// Message tag.
        tag: u8,
        /// Reference that was not found.
        order_ref: OrderRef,
    },

    /// Add or replace names a reference that is already live.
    #[error("duplicate order reference {order_ref} in '{kind}' message", kind = char::from(*.tag))]
    DuplicateOrderReference {
        /// Message tag.
        tag: u8,
        /// Reference already present.
        order_ref: OrderRef,
    },

    /// Execution or cancel for more shares than the order has left.
    #[error(
        "order {order_ref}: '{kind}' removes {requested} shares but only {remaining} remain",
        kind = char::from(*.tag)
    )]
    SharesExceedRemaining {
        /// Message tag.
        tag: u8,
        /// Order reference.
        order_ref: OrderRef,
        /// Shares the message tried to remove.
        requested: u32,
        /// Shares the order had left.
        remaining: u32,
    },
}

/// Resolver settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Produce trades for `C` executions flagged non-printable.
    pub count_non_printable: bool,
}

/// Outcome of applying one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Message touched no order state.
    Ignored,
    /// Order state changed, no volume produced.
    Updated,
    /// A `C` execution flagged non-printable reduced the order without a trade.
    NonPrintable,
    /// An execution priced from order state.
    Executed(ExecutedTrade),
}

impl Resolution {
    /// The executed trade, if any.
    #[must_use]
    pub const fn trade(self) -> Option<ExecutedTrade> {
        match self {
            Self::Executed(trade) => Some(trade),
            _ => None,
        }
    }
}

/// Owns the live-order table and applies order-state messages in feed order.
#[derive(Debug, Default)]
pub struct OrderResolver {
    orders: HashMap<OrderRef, LiveOrder>,
    options: ResolverOptions,
}

impl OrderResolver {
    /// Create an empty resolver with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty resolver with the given options.
    #[must_use]
    pub fn with_options(options: ResolverOptions) -> Self {
        Self {
            orders: HashMap::new(),
            options,
        }
    }

    /// Number of live orders.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.orders.len()
    }

    /// Look up a live order.
    #[must_use]
    pub fn get(&self, order_ref: OrderRef) -> Option<&LiveOrder> {
        self.orders.get(&order_ref)
    }

    /// Apply one message to the live-order table.
    ///
    /// On error nothing has been modified.
    pub fn apply(&mut self, message: &ItchMessage) -> Result<Resolution, ResolveError> {
        match message {
            ItchMessage::AddOrder(add) => self.add(b'A', add),
            ItchMessage::AddOrderMpid(add) => self.add(b'F', &add.order),
            ItchMessage::OrderExecuted(exec) => self.execute(exec),
            ItchMessage::OrderExecutedWithPrice(exec) => self.execute_with_price(exec),
            ItchMessage::OrderCancel(cancel) => self.cancel(cancel),
            ItchMessage::OrderDelete(delete) => self.delete(delete),
            ItchMessage::OrderReplace(replace) => self.replace(replace),
            _ => Ok(Resolution::Ignored),
        }
    }

    fn add(&mut self, tag: u8, add: &AddOrder) -> Result<Resolution, ResolveError> {
        if self.orders.contains_key(&add.order_ref) {
            return Err(ResolveError::DuplicateOrderReference {
                tag,
                order_ref: add.order_ref,
            });
        }
        self.orders.insert(
            add.order_ref,
            LiveOrder {
                stock: add.stock,
                side: add.side,
                price: add.price,
                remaining_shares: add.shares,
            },
        );
        Ok(Resolution::Updated)
    }

    fn execute(&mut self, exec: &OrderExecuted) -> Result<Resolution, ResolveError> {
        let order = self.reduce(b'E', exec.order_ref, exec.executed_shares)?;
        Ok(Resolution::Executed(ExecutedTrade {
            stock: order.stock,
            price: order.price,
            shares: u64::from(exec.executed_shares),
            timestamp: exec.header.timestamp,
            source: TradeSource::OrderExecuted,
        }))
    }

    fn execute_with_price(
        &mut self,
        exec: &OrderExecutedWithPrice,
    ) -> Result<Resolution, ResolveError> {
        let order = self.reduce(b'C', exec.order_ref, exec.executed_shares)?;
        if !exec.printable && !self.options.count_non_printable {
            return Ok(Resolution::NonPrintable);
        }
        Ok(Resolution::Executed(ExecutedTrade {
            stock: order.stock,
            price: exec.execution_price,
            shares: u64::from(exec.executed_shares),
            timestamp: exec.header.timestamp,
            source: TradeSource::OrderExecutedWithPrice,
        }))
    }

    fn cancel(&mut self, cancel: &OrderCancel) -> Result<Resolution, ResolveError> {
        self.reduce(b'X', cancel.order_ref, cancel.canceled_shares)?;
        Ok(Resolution::Updated)
    }

    fn delete(&mut self, delete: &OrderDelete) -> Result<Resolution, ResolveError> {
        self.orders
            .remove(&delete.order_ref)
            .map(|_| Resolution::Updated)
            .ok_or(ResolveError::UnknownOrderReference {
                tag: b'D',
                order_ref: delete.order_ref,
            })
    }

    fn replace(&mut self, replace: &OrderReplace) -> Result<Resolution, ResolveError> {
        let Some(original) = self.orders.get(&replace.original_order_ref).copied() else {
            return Err(ResolveError::UnknownOrderReference {
                tag: b'U',
                order_ref: replace.original_order_ref,
            });
        };
        // The new reference may reuse the original one.
        if replace.new_order_ref != replace.original_order_ref
            && self.orders.contains_key(&replace.new_order_ref)
        {
            return Err(ResolveError::DuplicateOrderReference {
                tag: b'U',
                order_ref: replace.new_order_ref,
            });
        }
        self.orders.remove(&replace.original_order_ref);
        self.orders.insert(
            replace.new_order_ref,
            LiveOrder {
                stock: original.stock,
                side: original.side,
                price: replace.price,
                remaining_shares: replace.shares,
            },
        );
        Ok(Resolution::Updated)
    }

    /// Remove `shares` from a live order, dropping it at zero.
    ///
    /// Returns the order as it was before the reduction.
    fn reduce(
        &mut self,
        tag: u8,
        order_ref: OrderRef,
        shares: u32,
    ) -> Result<LiveOrder, ResolveError> {
        let Some(order) = self.orders.get_mut(&order_ref) else {
            return Err(ResolveError::UnknownOrderReference { tag, order_ref });
        };
        let snapshot = *order;
        let Some(remaining) = order.remaining_shares.checked_sub(shares) else {
            return Err(ResolveError::SharesExceedRemaining {
                tag,
                order_ref,
                requested: shares,
                remaining: order.remaining_shares,
            });
        };
        if remaining == 0 {
            self.orders.remove(&order_ref);
        } else {
            order.remaining_shares = remaining;
        }
        Ok(snapshot)
    }
}
