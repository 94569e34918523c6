//! Message Feed Port (Driven Port)
//!
//! Interface for pulling decoded ITCH messages, in file order, from a day
//! file or any other source of frames.

use crate::domain::messages::ItchMessage;

/// Fatal feed failures. Each one ends the run.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Input ended inside a frame.
    #[error("truncated frame at byte offset {offset}: {detail}")]
    Truncated {
        /// Offset of the frame's length prefix.
        offset: u64,
        /// What was missing.
        detail: String,
    },

    /// Underlying read failed.
    #[error("read error at byte offset {offset}: {source}")]
    Io {
        /// Offset of the frame being read.
        offset: u64,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Frame does not match the layout of its message type.
    #[error("malformed frame at byte offset {offset}: {detail}")]
    Malformed {
        /// Offset of the frame's length prefix.
        offset: u64,
        /// Decoder message.
        detail: String,
    },
}

impl FeedError {
    /// Byte offset of the failing frame.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        match self {
            Self::Truncated { offset, .. }
            | Self::Io { offset, .. }
            | Self::Malformed { offset, .. } => *offset,
        }
    }
}

/// What one frame turned out to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedItem {
    /// A supported, well-formed message.
    Message(ItchMessage),
    /// A message type outside the supported set.
    UnknownType {
        /// Message tag.
        tag: u8,
    },
    /// A correctly sized frame with an enumerated or symbol byte out of range.
    InvalidField {
        /// Message tag.
        tag: u8,
        /// Field name.
        field: &'static str,
        /// Offending byte.
        value: u8,
    },
}

/// One frame from the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedRecord {
    /// Offset of the frame's length prefix in the input.
    pub offset: u64,
    /// Bytes the frame occupied, length prefix included.
    pub encoded_len: usize,
    /// Decoded content.
    pub item: FeedItem,
}

/// Port for reading frames in order.
pub trait MessageFeedPort {
    /// Next frame, or `Ok(None)` when the input ends on a frame boundary.
    fn next_record(&mut self) -> Result<Option<FeedRecord>, FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_exposed_for_every_variant() {
        let truncated = FeedError::Truncated {
            offset: 71,
            detail: "payload needs 31 bytes, 26 available".to_string(),
        };
        let malformed = FeedError::Malformed {
            offset: 38,
            detail: "empty frame".to_string(),
        };
        let io = FeedError::Io {
            offset: 5,
            source: std::io::Error::other("disk"),
        };

        assert_eq!(truncated.offset(), 71);
        assert_eq!(malformed.offset(), 38);
        assert_eq!(io.offset(), 5);
        assert_eq!(
            truncated.to_string(),
            "truncated frame at byte offset 71: payload needs 31 bytes, 26 available"
        );
    }
}
