//! Error kinds reported by the frame decoders.

use thiserror::Error;

use crate::frame_control::FrameControl;

/// Every decode operation returns one of these on failure
/// ## Description
/// Malformed input is always reported, never panicked on, so that one bad
/// frame in a capture never stops processing of the next one.
/// `UnsupportedFrameType` and `OutOfOrderHandshakeMessage` are
/// informational, see [`Error::is_fatal`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },

    #[error("unsupported frame type {0}")]
    UnsupportedFrameType(FrameControl),

    #[error("malformed tag chain: tag {tag_id:#04x} at offset {offset} declares {declared} bytes, {available} available")]
    MalformedTagChain {
        offset: usize,
        tag_id: u8,
        declared: usize,
        available: usize,
    },

    #[error("malformed handshake message: {0}")]
    MalformedHandshakeMessage(String),

    #[error("out of order handshake message: expected message {expected}, received message {received}")]
    OutOfOrderHandshakeMessage { expected: u8, received: u8 },
}

impl Error {
    /// Whether the error stops processing of the current frame.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::UnsupportedFrameType(_) | Error::OutOfOrderHandshakeMessage { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
