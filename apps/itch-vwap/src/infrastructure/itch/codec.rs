//! ITCH 5.0 Binary Codec
//!
//! Decodes frame payloads into [`ItchMessage`] and encodes them back. Every
//! supported tag has a fixed payload length; a mismatch means the framing is
//! out of step with the data and is fatal. An unsupported tag, or a bad
//! enumerated byte inside a correctly sized frame, is skipped by the caller.
//!
//! # Layout
//!
//! All integers are big-endian. Every payload starts with
//!
//! ```text
//! tag u8 | stock_locate u16 | tracking_number u16 | timestamp u48
//! ```
//!
//! followed by the type-specific fields in exchange order. Prices are `u32`
//! with four implied decimals, symbols are 8 space-padded ASCII bytes.

use thiserror::Error;

use crate::domain::messages::{
    AddOrder, AddOrderMpid, BrokenTrade, CrossTrade, Header, ItchMessage, OrderCancel,
    OrderDelete, OrderExecuted, OrderExecutedWithPrice, OrderReplace, Price, Side,
    StockDirectory, Symbol, SystemEvent, SystemEventCode, Trade,
};

/// Bytes shared by every message: tag plus header.
pub const HEADER_BYTES: usize = 11;

/// Largest 48-bit timestamp.
pub const MAX_TIMESTAMP: u64 = (1 << 48) - 1;

/// Payload length for a supported tag, tag byte included.
#[must_use]
pub const fn message_length(tag: u8) -> Option<usize> {
    match tag {
        b'S' => Some(12),
        b'R' => Some(39),
        b'A' => Some(36),
        b'F' => Some(40),
        b'E' => Some(31),
        b'C' => Some(36),
        b'X' => Some(23),
        b'D' => Some(19),
        b'U' => Some(35),
        b'P' => Some(44),
        b'Q' => Some(40),
        b'B' => Some(19),
        _ => None,
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Decoding failures.
///
/// `EmptyFrame` and `LengthMismatch` are malformed-field faults and abort the
/// run. `UnknownMessageType` and `InvalidField` only lose the one frame.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Tag outside the supported set.
    #[error("unknown message type '{kind}' (0x{tag:02x})", kind = char::from(*.tag).escape_default())]
    UnknownMessageType {
        /// Unsupported tag.
        tag: u8,
    },

    /// Frame has no payload.
    #[error("malformed field: empty frame")]
    EmptyFrame,

    /// Payload length differs from the tag's fixed layout.
    #[error(
        "malformed field: '{kind}' message is {actual} bytes, expected {expected}",
        kind = char::from(*.tag)
    )]
    LengthMismatch {
        /// Message tag.
        tag: u8,
        /// Layout length.
        expected: usize,
        /// Frame length.
        actual: usize,
    },

    /// Enumerated or symbol byte outside its domain.
    #[error(
        "invalid field: '{kind}' message has invalid {field} byte 0x{value:02x}",
        kind = char::from(*.tag)
    )]
    InvalidField {
        /// Message tag.
        tag: u8,
        /// Field name.
        field: &'static str,
        /// Offending byte.
        value: u8,
    },
}

// =============================================================================
// Decoding
// =============================================================================

/// Bounds-checked big-endian cursor over one payload.
struct FieldReader<'a> {
    tag: u8,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    const fn new(tag: u8, bytes: &'a [u8]) -> Self {
        // Skip the tag byte.
        Self { tag, bytes, pos: 1 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.pos + N;
        let field = self
            .bytes
            .get(self.pos..end)
            .and_then(|slice| <[u8; N]>::try_from(slice).ok())
            .ok_or(DecodeError::LengthMismatch {
                tag: self.tag,
                expected: end,
                actual: self.bytes.len(),
            })?;
        self.pos = end;
        Ok(field)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.take()?))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    fn u48(&mut self) -> Result<u64, DecodeError> {
        let [a, b, c, d, e, f] = self.take::<6>()?;
        Ok(u64::from_be_bytes([0, 0, a, b, c, d, e, f]))
    }

    fn u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_be_bytes(self.take()?))
    }

    fn price(&mut self) -> Result<Price, DecodeError> {
        self.u32().map(Price::from_raw)
    }

    fn side(&mut self) -> Result<Side, DecodeError> {
        let value = self.u8()?;
        Side::from_byte(value).ok_or(DecodeError::InvalidField {
            tag: self.tag,
            field: "side",
            value,
        })
    }

    fn printable(&mut self) -> Result<bool, DecodeError> {
        match self.u8()? {
            b'Y' => Ok(true),
            b'N' => Ok(false),
            value => Err(DecodeError::InvalidField {
                tag: self.tag,
                field: "printable",
                value,
            }),
        }
    }

    fn symbol(&mut self) -> Result<Symbol, DecodeError> {
        let bytes = self.take::<{ Symbol::WIDTH }>()?;
        Symbol::from_bytes(bytes).ok_or_else(|| DecodeError::InvalidField {
            tag: self.tag,
            field: "stock",
            value: bytes
                .iter()
                .copied()
                .find(|b| *b != b' ' && !b.is_ascii_graphic())
                .unwrap_or_default(),
        })
    }

    fn header(&mut self) -> Result<Header, DecodeError> {
        Ok(Header {
            stock_locate: self.u16()?,
            tracking_number: self.u16()?,
            timestamp: self.u48()?,
        })
    }

    fn add_order(&mut self) -> Result<AddOrder, DecodeError> {
        Ok(AddOrder {
            header: self.header()?,
            order_ref: self.u64()?,
            side: self.side()?,
            shares: self.u32()?,
            stock: self.symbol()?,
            price: self.price()?,
        })
    }
}

/// Decode one frame payload.
pub fn decode(payload: &[u8]) -> Result<ItchMessage, DecodeError> {
    let Some(&tag) = payload.first() else {
        return Err(DecodeError::EmptyFrame);
    };
    let Some(expected) = message_length(tag) else {
        return Err(DecodeError::UnknownMessageType { tag });
    };
    if payload.len() != expected {
        return Err(DecodeError::LengthMismatch {
            tag,
            expected,
            actual: payload.len(),
        });
    }

    let mut r = FieldReader::new(tag, payload);
    let message = match tag {
        b'S' => ItchMessage::SystemEvent(SystemEvent {
            header: r.header()?,
            event_code: SystemEventCode::from_byte(r.u8()?),
        }),
        b'R' => ItchMessage::StockDirectory(StockDirectory {
            header: r.header()?,
            stock: r.symbol()?,
            market_category: r.u8()?,
            financial_status: r.u8()?,
            round_lot_size: r.u32()?,
            round_lots_only: r.u8()?,
            issue_classification: r.u8()?,
            issue_sub_type: r.take()?,
            authenticity: r.u8()?,
            short_sale_threshold: r.u8()?,
            ipo_flag: r.u8()?,
            luld_reference_price_tier: r.u8()?,
            etp_flag: r.u8()?,
            etp_leverage_factor: r.u32()?,
            inverse_indicator: r.u8()?,
        }),
        b'A' => ItchMessage::AddOrder(r.add_order()?),
        b'F' => ItchMessage::AddOrderMpid(AddOrderMpid {
            order: r.add_order()?,
            attribution: r.take()?,
        }),
        b'E' => ItchMessage::OrderExecuted(OrderExecuted {
            header: r.header()?,
            order_ref: r.u64()?,
            executed_shares: r.u32()?,
            match_number: r.u64()?,
        }),
        b'C' => ItchMessage::OrderExecutedWithPrice(OrderExecutedWithPrice {
            header: r.header()?,
            order_ref: r.u64()?,
            executed_shares: r.u32()?,
            match_number: r.u64()?,
            printable: r.printable()?,
            execution_price: r.price()?,
        }),
        b'X' => ItchMessage::OrderCancel(OrderCancel {
            header: r.header()?,
            order_ref: r.u64()?,
            canceled_shares: r.u32()?,
        }),
        b'D' => ItchMessage::OrderDelete(OrderDelete {
            header: r.header()?,
            order_ref: r.u64()?,
        }),
        b'U' => ItchMessage::OrderReplace(OrderReplace {
            header: r.header()?,
            original_order_ref: r.u64()?,
            new_order_ref: r.u64()?,
            shares: r.u32()?,
            price: r.price()?,
        }),
        b'P' => ItchMessage::Trade(Trade {
            header: r.header()?,
            order_ref: r.u64()?,
            side: r.side()?,
            shares: r.u32()?,
            stock: r.symbol()?,
            price: r.price()?,
            match_number: r.u64()?,
        }),
        b'Q' => ItchMessage::CrossTrade(CrossTrade {
            header: r.header()?,
            shares: r.u64()?,
            stock: r.symbol()?,
            cross_price: r.price()?,
            match_number: r.u64()?,
            cross_type: r.u8()?,
        }),
        b'B' => ItchMessage::BrokenTrade(BrokenTrade {
            header: r.header()?,
            match_number: r.u64()?,
        }),
        _ => return Err(DecodeError::UnknownMessageType { tag }),
    };
    Ok(message)
}

// =============================================================================
// Encoding
// =============================================================================

/// Big-endian payload builder.
struct FieldWriter {
    bytes: Vec<u8>,
}

impl FieldWriter {
    fn new(tag: u8) -> Self {
        let mut bytes = Vec::with_capacity(message_length(tag).unwrap_or(HEADER_BYTES));
        bytes.push(tag);
        Self { bytes }
    }

    fn u8(&mut self, value: u8) -> &mut Self {
        self.bytes.push(value);
        self
    }

    fn u16(&mut self, value: u16) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    fn u32(&mut self, value: u32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    fn u48(&mut self, value: u64) -> &mut Self {
        self.bytes
            .extend_from_slice(&(value & MAX_TIMESTAMP).to_be_bytes()[2..]);
        self
    }

    fn u64(&mut self, value: u64) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    fn raw(&mut self, value: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(value);
        self
    }

    fn header(&mut self, header: &Header) -> &mut Self {
        self.u16(header.stock_locate)
            .u16(header.tracking_number)
            .u48(header.timestamp)
    }

    fn add_order(&mut self, add: &AddOrder) -> &mut Self {
        self.header(&add.header)
            .u64(add.order_ref)
            .u8(add.side.as_byte())
            .u32(add.shares)
            .raw(add.stock.as_bytes())
            .u32(add.price.raw())
    }

    fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }
}

/// Encode a message as a frame payload (no length prefix).
///
/// Timestamps are masked to 48 bits.
#[must_use]
pub fn encode(message: &ItchMessage) -> Vec<u8> {
    let mut w = FieldWriter::new(message.tag());
    match message {
        ItchMessage::SystemEvent(m) => w.header(&m.header).u8(m.event_code.as_byte()),
        ItchMessage::StockDirectory(m) => w
            .header(&m.header)
            .raw(m.stock.as_bytes())
            .u8(m.market_category)
            .u8(m.financial_status)
            .u32(m.round_lot_size)
            .u8(m.round_lots_only)
            .u8(m.issue_classification)
            .raw(&m.issue_sub_type)
            .u8(m.authenticity)
            .u8(m.short_sale_threshold)
            .u8(m.ipo_flag)
            .u8(m.luld_reference_price_tier)
            .u8(m.etp_flag)
            .u32(m.etp_leverage_factor)
            .u8(m.inverse_indicator),
        ItchMessage::AddOrder(m) => w.add_order(m),
        ItchMessage::AddOrderMpid(m) => w.add_order(&m.order).raw(&m.attribution),
        ItchMessage::OrderExecuted(m) => w
            .header(&m.header)
            .u64(m.order_ref)
            .u32(m.executed_shares)
            .u64(m.match_number),
        ItchMessage::OrderExecutedWithPrice(m) => w
            .header(&m.header)
            .u64(m.order_ref)
            .u32(m.executed_shares)
            .u64(m.match_number)
            .u8(if m.printable { b'Y' } else { b'N' })
            .u32(m.execution_price.raw()),
        ItchMessage::OrderCancel(m) => w
            .header(&m.header)
            .u64(m.order_ref)
            .u32(m.canceled_shares),
        ItchMessage::OrderDelete(m) => w.header(&m.header).u64(m.order_ref),
        ItchMessage::OrderReplace(m) => w
            .header(&m.header)
            .u64(m.original_order_ref)
            .u64(m.new_order_ref)
            .u32(m.shares)
            .u32(m.price.raw()),
        ItchMessage::Trade(m) => w
            .header(&m.header)
            .u64(m.order_ref)
            .u8(m.side.as_byte())
            .u32(m.shares)
            .raw(m.stock.as_bytes())
            .u32(m.price.raw())
            .u64(m.match_number),
        ItchMessage::CrossTrade(m) => w
            .header(&m.header)
            .u64(m.shares)
            .raw(m.stock.as_bytes())
            .u32(m.cross_price.raw())
            .u64(m.match_number)
            .u8(m.cross_type),
        ItchMessage::BrokenTrade(m) => w.header(&m.header).u64(m.match_number),
    };
    w.finish()
}

/// Encode a message with its 2-byte length prefix.
#[must_use]
pub fn encode_frame(message: &ItchMessage) -> Vec<u8> {
    let payload = encode(message);
    let mut frame = Vec::with_capacity(payload.len() + 2);
    // Payloads are at most 44 bytes.
    frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    frame.extend_from_slice(&payload);
    frame
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::domain::window::hms;

    fn header(timestamp: u64) -> Header {
        Header {
            stock_locate: 13,
            tracking_number: 2,
            timestamp,
        }
    }

    fn sym(ticker: &str) -> Symbol {
        Symbol::new(ticker).unwrap()
    }

    fn add(order_ref: u64) -> AddOrder {
        AddOrder {
            header: header(hms(10, 15, 0)),
            order_ref,
            side: Side::Sell,
            shares: 100,
            stock: sym("AAPL"),
            price: Price::from_raw(1_500_000),
        }
    }

    fn one_of_each() -> Vec<ItchMessage> {
        vec![
            ItchMessage::SystemEvent(SystemEvent {
                header: header(hms(9, 30, 0)),
                event_code: SystemEventCode::StartOfMarketHours,
            }),
            ItchMessage::StockDirectory(StockDirectory {
                header: header(hms(3, 0, 0)),
                stock: sym("AAPL"),
                market_category: b'Q',
                financial_status: b'N',
                round_lot_size: 100,
                round_lots_only: b'N',
                issue_classification: b'C',
                issue_sub_type: *b"Z ",
                authenticity: b'P',
                short_sale_threshold: b'N',
                ipo_flag: b' ',
                luld_reference_price_tier: b'1',
                etp_flag: b'N',
                etp_leverage_factor: 0,
                inverse_indicator: b'N',
            }),
            ItchMessage::AddOrder(add(1)),
            ItchMessage::AddOrderMpid(AddOrderMpid {
                order: add(2),
                attribution: *b"GSCO",
            }),
            ItchMessage::OrderExecuted(OrderExecuted {
                header: header(hms(10, 20, 0)),
                order_ref: 1,
                executed_shares: 40,
                match_number: 99,
            }),
            ItchMessage::OrderExecutedWithPrice(OrderExecutedWithPrice {
                header: header(hms(10, 45, 0)),
                order_ref: 1,
                executed_shares: 60,
                match_number: 100,
                printable: true,
                execution_price: Price::from_raw(1_505_000),
            }),
            ItchMessage::OrderCancel(OrderCancel {
                header: header(hms(11, 0, 0)),
                order_ref: 2,
                canceled_shares: 10,
            }),
            ItchMessage::OrderDelete(OrderDelete {
                header: header(hms(11, 1, 0)),
                order_ref: 2,
            }),
            ItchMessage::OrderReplace(OrderReplace {
                header: header(hms(11, 2, 0)),
                original_order_ref: 3,
                new_order_ref: 4,
                shares: 500,
                price: Price::from_raw(1_499_900),
            }),
            ItchMessage::Trade(Trade {
                header: header(hms(12, 0, 0)),
                order_ref: 0,
                side: Side::Buy,
                shares: 300,
                stock: sym("MSFT"),
                price: Price::from_raw(4_100_000),
                match_number: 101,
            }),
            ItchMessage::CrossTrade(CrossTrade {
                header: header(hms(16, 0, 0)),
                shares: 1_000_000,
                stock: sym("MSFT"),
                cross_price: Price::from_raw(4_120_000),
                match_number: 102,
                cross_type: b'C',
            }),
            ItchMessage::BrokenTrade(BrokenTrade {
                header: header(hms(16, 5, 0)),
                match_number: 101,
            }),
        ]
    }

    #[test]
    fn encoded_lengths_match_layouts() {
        for message in one_of_each() {
            let payload = encode(&message);
            assert_eq!(
                Some(payload.len()),
                message_length(message.tag()),
                "layout length for '{}'",
                char::from(message.tag())
            );
        }
    }

    #[test]
    fn every_message_type_round_trips() {
        for message in one_of_each() {
            assert_eq!(decode(&encode(&message)).unwrap(), message);
        }
    }

    #[test]
    fn decodes_known_bytes() {
        // D: locate 1, tracking 0, timestamp 0x0000_0102_0304, ref 0x0a
        let payload = [
            b'D', 0, 1, 0, 0, 0, 0, 1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0, 0x0a,
        ];

        let message = decode(&payload).unwrap();

        assert_eq!(
            message,
            ItchMessage::OrderDelete(OrderDelete {
                header: Header {
                    stock_locate: 1,
                    tracking_number: 0,
                    timestamp: 0x0102_0304,
                },
                order_ref: 10,
            })
        );
    }

    #[test]
    fn u48_timestamp_uses_all_six_bytes() {
        let message = ItchMessage::BrokenTrade(BrokenTrade {
            header: header(0xAABB_CCDD_EEFF),
            match_number: 1,
        });

        let payload = encode(&message);

        assert_eq!(&payload[5..11], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(decode(&payload).unwrap().timestamp(), 0xAABB_CCDD_EEFF);
    }

    #[test]
    fn unknown_tag_is_reported() {
        let err = decode(b"Hxxxxxxxxxxxxxxxxxxxxxxxx").unwrap_err();
        assert_eq!(err, DecodeError::UnknownMessageType { tag: b'H' });
    }

    #[test]
    fn empty_frame_is_rejected() {
        let err = decode(&[]).unwrap_err();
        assert_eq!(err, DecodeError::EmptyFrame);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut payload = encode(&one_of_each()[2]);
        payload.pop();

        let err = decode(&payload).unwrap_err();

        assert_eq!(
            err,
            DecodeError::LengthMismatch {
                tag: b'A',
                expected: 36,
                actual: 35
            }
        );
        assert_eq!(
            err.to_string(),
            "malformed field: 'A' message is 35 bytes, expected 36"
        );
    }

    #[test]
    fn invalid_side_is_rejected() {
        let mut payload = encode(&ItchMessage::AddOrder(add(1)));
        payload[19] = b'Z';

        let err = decode(&payload).unwrap_err();

        assert_eq!(
            err,
            DecodeError::InvalidField {
                tag: b'A',
                field: "side",
                value: b'Z'
            }
        );
    }

    #[test]
    fn invalid_printable_flag_is_rejected() {
        let mut payload = encode(&one_of_each()[5]);
        payload[31] = b'?';

        assert!(matches!(
            decode(&payload),
            Err(DecodeError::InvalidField {
                field: "printable",
                ..
            })
        ));
    }

    #[test]
    fn invalid_symbol_byte_is_rejected() {
        let mut payload = encode(&ItchMessage::AddOrder(add(1)));
        payload[24] = 0x00;

        assert_eq!(
            decode(&payload),
            Err(DecodeError::InvalidField {
                tag: b'A',
                field: "stock",
                value: 0
            })
        );
    }

    #[test]
    fn frame_has_length_prefix() {
        let frame = encode_frame(&ItchMessage::AddOrder(add(1)));
        assert_eq!(&frame[..2], &[0, 36]);
        assert_eq!(frame.len(), 38);
    }

    fn ticker() -> impl Strategy<Value = Symbol> {
        "[A-Z]{1,8}".prop_map(|s| Symbol::new(&s).unwrap())
    }

    fn side() -> impl Strategy<Value = Side> {
        prop_oneof![Just(Side::Buy), Just(Side::Sell)]
    }

    fn any_header() -> impl Strategy<Value = Header> {
        (any::<u16>(), any::<u16>(), 0..=MAX_TIMESTAMP).prop_map(
            |(stock_locate, tracking_number, timestamp)| Header {
                stock_locate,
                tracking_number,
                timestamp,
            },
        )
    }

    fn message() -> impl Strategy<Value = ItchMessage> {
        prop_oneof![
            (any_header(), any::<u64>(), side(), any::<u32>(), ticker(), any::<u32>()).prop_map(
                |(header, order_ref, side, shares, stock, price)| ItchMessage::AddOrder(AddOrder {
                    header,
                    order_ref,
                    side,
                    shares,
                    stock,
                    price: Price::from_raw(price),
                })
            ),
            (any_header(), any::<u64>(), any::<u32>(), any::<u64>()).prop_map(
                |(header, order_ref, executed_shares, match_number)| {
                    ItchMessage::OrderExecuted(OrderExecuted {
                        header,
                        order_ref,
                        executed_shares,
                        match_number,
                    })
                }
            ),
            (
                any_header(),
                any::<u64>(),
                any::<u32>(),
                any::<u64>(),
                any::<bool>(),
                any::<u32>()
            )
                .prop_map(
                    |(header, order_ref, executed_shares, match_number, printable, price)| {
                        ItchMessage::OrderExecutedWithPrice(OrderExecutedWithPrice {
                            header,
                            order_ref,
                            executed_shares,
                            match_number,
                            printable,
                            execution_price: Price::from_raw(price),
                        })
                    }
                ),
            (any_header(), any::<u64>(), any::<u64>(), any::<u32>(), any::<u32>()).prop_map(
                |(header, original_order_ref, new_order_ref, shares, price)| {
                    ItchMessage::OrderReplace(OrderReplace {
                        header,
                        original_order_ref,
                        new_order_ref,
                        shares,
                        price: Price::from_raw(price),
                    })
                }
            ),
            (any_header(), any::<u64>(), ticker(), any::<u32>(), any::<u64>(), any::<u8>())
                .prop_map(|(header, shares, stock, price, match_number, cross_type)| {
                    ItchMessage::CrossTrade(CrossTrade {
                        header,
                        shares,
                        stock,
                        cross_price: Price::from_raw(price),
                        match_number,
                        cross_type,
                    })
                }),
        ]
    }

    proptest! {
        #[test]
        fn framed_sequences_round_trip(messages in prop::collection::vec(message(), 0..50)) {
            use std::io::Cursor;

            use crate::infrastructure::itch::framing::FrameReader;

            let bytes: Vec<u8> = messages.iter().flat_map(encode_frame).collect();
            let mut reader = FrameReader::new(Cursor::new(bytes));
            let mut decoded = Vec::new();
            while let Some(frame) = reader.next_frame().unwrap() {
                decoded.push(decode(frame.payload).unwrap());
            }

            prop_assert_eq!(decoded, messages);
        }
    }
}
