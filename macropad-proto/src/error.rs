//! Protocol error types.

use core::fmt;

/// Errors produced while decoding or encoding protocol text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// A character outside `[0-9a-fA-F]` where a hex digit was expected.
    InvalidDigit,
    /// Header truncated, header contains a non-hex character, or the debug
    /// envelope is not closed.
    MalformedInstruction,
    /// The free-form payload does not fit in [`MAX_EXTRA_LEN`](crate::MAX_EXTRA_LEN).
    PayloadTooLong,
    /// The output buffer cannot hold the encoded text.
    BufferTooSmall,
    /// A `sendf` template uses an unknown placeholder or an unbalanced brace.
    MalformedTemplate,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDigit => write!(f, "invalid hex digit"),
            Self::MalformedInstruction => write!(f, "malformed instruction"),
            Self::PayloadTooLong => write!(f, "payload too long"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::MalformedTemplate => write!(f, "malformed template"),
        }
    }
}

/// Error returned by [`Instruction::send`](crate::Instruction::send) and
/// [`Instruction::sendf`](crate::Instruction::sendf).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError<E> {
    /// The frame could not be built.
    Encode(ProtocolError),
    /// The underlying writer failed.
    Write(E),
}

impl<E> From<ProtocolError> for SendError<E> {
    fn from(err: ProtocolError) -> Self {
        SendError::Encode(err)
    }
}

impl<E: fmt::Debug> fmt::Display for SendError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "encode error: {}", e),
            Self::Write(e) => write!(f, "write error: {:?}", e),
        }
    }
}
