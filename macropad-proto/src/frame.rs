//! Delimiter-based frame accumulation for the inbound byte stream.

use heapless::Vec;

use crate::instruction::{FRAME_DELIMITER, MAX_FRAME_LEN};

/// Accumulates bytes until [`FRAME_DELIMITER`] and hands out complete frames.
///
/// If a frame exceeds the buffer, the first [`MAX_FRAME_LEN`] bytes are kept
/// and the rest is discarded up to the next delimiter. The header sits at the
/// front, so the truncated frame still decodes and only its payload is cut.
///
/// # Example
///
/// ```
/// use macropad_proto::FrameReader;
///
/// let mut reader = FrameReader::new();
/// let mut frames = 0;
/// for &b in b"01057f\n0b01\n" {
///     if let Some(frame) = reader.push(b) {
///         assert!(frame.len() >= 4);
///         frames += 1;
///     }
/// }
/// assert_eq!(frames, 2);
/// ```
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: Vec<u8, MAX_FRAME_LEN>,
    truncated: bool,
    complete: bool,
}

impl FrameReader {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            truncated: false,
            complete: false,
        }
    }

    /// Feed one byte.
    ///
    /// Returns `Some` when a delimiter completes a frame; the slice is valid
    /// until the next call. Empty frames, including a lone `\r` left by a
    /// blank CRLF line, are skipped.
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        if self.complete {
            self.buffer.clear();
            self.truncated = false;
            self.complete = false;
        }

        if byte == FRAME_DELIMITER {
            if self.buffer.is_empty() || self.buffer[..] == b"\r"[..] {
                self.buffer.clear();
                return None;
            }
            self.complete = true;
            return Some(&self.buffer);
        }

        if self.buffer.push(byte).is_err() {
            self.truncated = true;
        }
        None
    }

    /// Whether bytes were dropped from the frame being accumulated, or from
    /// the frame just returned by [`push`](Self::push).
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Drop any partially accumulated frame.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.truncated = false;
        self.complete = false;
    }

    /// Number of bytes of the frame currently being accumulated.
    #[must_use]
    pub fn pending(&self) -> usize {
        if self.complete {
            0
        } else {
            self.buffer.len()
        }
    }
}
