//! ITCH 5.0 Wire Format
//!
//! - **Framing**: 2-byte big-endian length prefix per message
//! - **Codec**: fixed per-tag layouts, big-endian integers, 48-bit timestamps
//! - **Feed**: the message feed port over framing and codec

pub mod codec;
pub mod feed;
pub mod framing;

pub use codec::{DecodeError, decode, encode, encode_frame, message_length};
pub use feed::ItchFeed;
pub use framing::{Frame, FrameError, FramePart, FrameReader, FrameWriter};
