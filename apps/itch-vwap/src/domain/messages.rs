//! ITCH 5.0 Message Types
//!
//! Typed representation of the TotalView-ITCH 5.0 messages the VWAP pipeline
//! understands. Each variant is a flat record with the exchange's native field
//! widths; the binary layout itself lives in `infrastructure::itch::codec`.
//!
//! # Supported Messages
//!
//! | Tag | Message | Used for |
//! |-----|---------|----------|
//! | `S` | System Event | market open/close detection |
//! | `R` | Stock Directory | listed securities |
//! | `A` / `F` | Add Order (with MPID) | live order state |
//! | `E` / `C` | Order Executed (with price) | executed volume |
//! | `X` / `D` / `U` | Cancel / Delete / Replace | live order state |
//! | `P` / `Q` | Trade / Cross Trade | executed volume |
//! | `B` | Broken Trade | decoded, no effect |

use std::fmt;

use rust_decimal::Decimal;

/// Nanoseconds since midnight, as carried in the 48-bit ITCH timestamp.
pub type Nanos = u64;

/// Exchange-assigned order reference number.
pub type OrderRef = u64;

/// Implied decimal places in an ITCH price field.
pub const PRICE_SCALE: u32 = 4;

// =============================================================================
// Value Types
// =============================================================================

/// Fixed-point price with four implied decimal places (`1_500_000` = $150.0000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(u32);

impl Price {
    /// Create a price from its raw wire value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw wire value in ticks of 1/10_000.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Price as an exact decimal.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(i64::from(self.0), PRICE_SCALE)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_decimal())
    }
}

/// Security symbol: 8 ASCII bytes, right-padded with spaces.
///
/// Ordering of the padded bytes matches ordering of the trimmed ticker
/// because every printable ticker byte sorts after the space pad.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol([u8; Self::WIDTH]);

impl Symbol {
    /// Wire width of a symbol field.
    pub const WIDTH: usize = 8;

    /// Build a symbol from a ticker string.
    ///
    /// Returns `None` if the ticker is empty, longer than eight bytes, or
    /// contains anything other than printable ASCII.
    #[must_use]
    pub fn new(ticker: &str) -> Option<Self> {
        let bytes = ticker.as_bytes();
        if bytes.is_empty() || bytes.len() > Self::WIDTH {
            return None;
        }
        let mut padded = [b' '; Self::WIDTH];
        padded[..bytes.len()].copy_from_slice(bytes);
        Self::from_bytes(padded)
    }

    /// Build a symbol from its padded wire bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; Self::WIDTH]) -> Option<Self> {
        bytes
            .iter()
            .all(|b| *b == b' ' || b.is_ascii_graphic())
            .then_some(Self(bytes))
    }

    /// Padded wire bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::WIDTH] {
        &self.0
    }

    /// Ticker without the space padding.
    #[must_use]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0)
            .unwrap_or_default()
            .trim_end_matches(' ')
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Symbol").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order side indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy order (`B`).
    Buy,
    /// Sell order (`S`).
    Sell,
}

impl Side {
    /// Parse the wire byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'B' => Some(Self::Buy),
            b'S' => Some(Self::Sell),
            _ => None,
        }
    }

    /// Wire byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Buy => b'B',
            Self::Sell => b'S',
        }
    }
}

/// System event codes carried by the `S` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventCode {
    /// Start of messages (`O`).
    StartOfMessages,
    /// Start of system hours (`S`).
    StartOfSystemHours,
    /// Start of market hours (`Q`).
    StartOfMarketHours,
    /// End of market hours (`M`).
    EndOfMarketHours,
    /// End of system hours (`E`).
    EndOfSystemHours,
    /// End of messages (`C`).
    EndOfMessages,
    /// Any code not listed above, kept verbatim.
    Other(u8),
}

impl SystemEventCode {
    /// Parse the wire byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            b'O' => Self::StartOfMessages,
            b'S' => Self::StartOfSystemHours,
            b'Q' => Self::StartOfMarketHours,
            b'M' => Self::EndOfMarketHours,
            b'E' => Self::EndOfSystemHours,
            b'C' => Self::EndOfMessages,
            other => Self::Other(other),
        }
    }

    /// Wire byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::StartOfMessages => b'O',
            Self::StartOfSystemHours => b'S',
            Self::StartOfMarketHours => b'Q',
            Self::EndOfMarketHours => b'M',
            Self::EndOfSystemHours => b'E',
            Self::EndOfMessages => b'C',
            Self::Other(byte) => byte,
        }
    }
}

// =============================================================================
// Message Records
// =============================================================================

/// Fields common to every ITCH message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Locate code identifying the security for the day.
    pub stock_locate: u16,
    /// Nasdaq internal tracking number.
    pub tracking_number: u16,
    /// Nanoseconds since midnight.
    pub timestamp: Nanos,
}

/// System Event (`S`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemEvent {
    /// Common header.
    pub header: Header,
    /// Event code.
    pub event_code: SystemEventCode,
}

/// Stock Directory (`R`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDirectory {
    /// Common header.
    pub header: Header,
    /// Security symbol.
    pub stock: Symbol,
    /// Listing market category.
    pub market_category: u8,
    /// Financial status indicator.
    pub financial_status: u8,
    /// Round lot size in shares.
    pub round_lot_size: u32,
    /// Whether only round lots are accepted (`Y`/`N`).
    pub round_lots_only: u8,
    /// Issue classification.
    pub issue_classification: u8,
    /// Issue sub-type.
    pub issue_sub_type: [u8; 2],
    /// Production or test (`P`/`T`).
    pub authenticity: u8,
    /// Reg SHO short sale threshold indicator.
    pub short_sale_threshold: u8,
    /// IPO flag.
    pub ipo_flag: u8,
    /// LULD reference price tier.
    pub luld_reference_price_tier: u8,
    /// ETP flag.
    pub etp_flag: u8,
    /// ETP leverage factor.
    pub etp_leverage_factor: u32,
    /// Inverse ETP indicator.
    pub inverse_indicator: u8,
}

/// Add Order without attribution (`A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOrder {
    /// Common header.
    pub header: Header,
    /// New order reference.
    pub order_ref: OrderRef,
    /// Buy or sell.
    pub side: Side,
    /// Displayed shares.
    pub shares: u32,
    /// Security symbol.
    pub stock: Symbol,
    /// Limit price.
    pub price: Price,
}

/// Add Order with market participant attribution (`F`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOrderMpid {
    /// Order fields shared with `A`.
    pub order: AddOrder,
    /// Market participant identifier.
    pub attribution: [u8; 4],
}

/// Order Executed (`E`). Executes at the resting order's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderExecuted {
    /// Common header.
    pub header: Header,
    /// Executed order reference.
    pub order_ref: OrderRef,
    /// Shares executed.
    pub executed_shares: u32,
    /// Exchange match number.
    pub match_number: u64,
}

/// Order Executed With Price (`C`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderExecutedWithPrice {
    /// Common header.
    pub header: Header,
    /// Executed order reference.
    pub order_ref: OrderRef,
    /// Shares executed.
    pub executed_shares: u32,
    /// Exchange match number.
    pub match_number: u64,
    /// Whether the execution should be counted toward volume.
    pub printable: bool,
    /// Price of this execution.
    pub execution_price: Price,
}

/// Order Cancel (`X`). Partial cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCancel {
    /// Common header.
    pub header: Header,
    /// Canceled order reference.
    pub order_ref: OrderRef,
    /// Shares removed from the order.
    pub canceled_shares: u32,
}

/// Order Delete (`D`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderDelete {
    /// Common header.
    pub header: Header,
    /// Deleted order reference.
    pub order_ref: OrderRef,
}

/// Order Replace (`U`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderReplace {
    /// Common header.
    pub header: Header,
    /// Reference being replaced.
    pub original_order_ref: OrderRef,
    /// Reference of the replacement order.
    pub new_order_ref: OrderRef,
    /// Shares of the replacement order.
    pub shares: u32,
    /// Price of the replacement order.
    pub price: Price,
}

/// Trade, non-cross (`P`). Execution against a non-displayed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    /// Common header.
    pub header: Header,
    /// Reference of the non-displayed order (zero on the public feed).
    pub order_ref: OrderRef,
    /// Side of the non-displayed order.
    pub side: Side,
    /// Shares executed.
    pub shares: u32,
    /// Security symbol.
    pub stock: Symbol,
    /// Execution price.
    pub price: Price,
    /// Exchange match number.
    pub match_number: u64,
}

/// Cross Trade (`Q`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossTrade {
    /// Common header.
    pub header: Header,
    /// Shares matched in the cross.
    pub shares: u64,
    /// Security symbol.
    pub stock: Symbol,
    /// Cross price.
    pub cross_price: Price,
    /// Exchange match number.
    pub match_number: u64,
    /// Opening, closing, halt/IPO or extended-hours cross.
    pub cross_type: u8,
}

/// Broken Trade (`B`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokenTrade {
    /// Common header.
    pub header: Header,
    /// Match number of the broken execution.
    pub match_number: u64,
}

/// A decoded ITCH message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItchMessage {
    /// `S`
    SystemEvent(SystemEvent),
    /// `R`
    StockDirectory(StockDirectory),
    /// `A`
    AddOrder(AddOrder),
    /// `F`
    AddOrderMpid(AddOrderMpid),
    /// `E`
    OrderExecuted(OrderExecuted),
    /// `C`
    OrderExecutedWithPrice(OrderExecutedWithPrice),
    /// `X`
    OrderCancel(OrderCancel),
    /// `D`
    OrderDelete(OrderDelete),
    /// `U`
    OrderReplace(OrderReplace),
    /// `P`
    Trade(Trade),
    /// `Q`
    CrossTrade(CrossTrade),
    /// `B`
    BrokenTrade(BrokenTrade),
}

impl ItchMessage {
    /// Wire type tag.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::SystemEvent(_) => b'S',
            Self::StockDirectory(_) => b'R',
            Self::AddOrder(_) => b'A',
            Self::AddOrderMpid(_) => b'F',
            Self::OrderExecuted(_) => b'E',
            Self::OrderExecutedWithPrice(_) => b'C',
            Self::OrderCancel(_) => b'X',
            Self::OrderDelete(_) => b'D',
            Self::OrderReplace(_) => b'U',
            Self::Trade(_) => b'P',
            Self::CrossTrade(_) => b'Q',
            Self::BrokenTrade(_) => b'B',
        }
    }

    /// Common header.
    #[must_use]
    pub const fn header(&self) -> &Header {
        match self {
            Self::SystemEvent(m) => &m.header,
            Self::StockDirectory(m) => &m.header,
            Self::AddOrder(m) => &m.header,
            Self::AddOrderMpid(m) => &m.order.header,
            Self::OrderExecuted(m) => &m.header,
            Self::OrderExecutedWithPrice(m) => &m.header,
            Self::OrderCancel(m) => &m.header,
            Self::OrderDelete(m) => &m.header,
            Self::OrderReplace(m) => &m.header,
            Self::Trade(m) => &m.header,
            Self::CrossTrade(m) => &m.header,
            Self::BrokenTrade(m) => &m.header,
        }
    }

    /// Nanoseconds since midnight.
    #[must_use]
    pub const fn timestamp(&self) -> Nanos {
        self.header().timestamp
    }
}
