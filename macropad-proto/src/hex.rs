//! Hex digit codec shared by both directions of the protocol.
//!
//! These functions work directly on byte slices so the firmware never needs
//! a general-purpose parser or any heap allocation.

use crate::error::ProtocolError;

/// Hex digits lookup table (lowercase on output, either case on input).
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Widest value [`decode_hex`] and [`encode_hex`] handle (32 bits).
pub const MAX_HEX_DIGITS: usize = 8;

/// Convert a hex character to its value.
#[inline]
pub fn hex_digit_value(b: u8) -> Result<u8, ProtocolError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(ProtocolError::InvalidDigit),
    }
}

/// Decode `digits` hex characters from the start of `chars`, most
/// significant digit first.
///
/// Characters past `digits` are ignored. Decoding stops at the first bad
/// character with [`ProtocolError::InvalidDigit`].
///
/// # Example
///
/// ```
/// use macropad_proto::hex::decode_hex;
///
/// assert_eq!(decode_hex(b"01057f", 6), Ok(0x01057f));
/// assert_eq!(decode_hex(b"7F", 2), Ok(127));
/// ```
pub fn decode_hex(chars: &[u8], digits: usize) -> Result<u32, ProtocolError> {
    if digits > MAX_HEX_DIGITS {
        return Err(ProtocolError::MalformedInstruction);
    }
    let chars = chars
        .get(..digits)
        .ok_or(ProtocolError::MalformedInstruction)?;

    let mut value: u32 = 0;
    for &b in chars {
        // At most 8 iterations, so the shift never drops set bits of a valid value
        value = (value << 4) | hex_digit_value(b)? as u32;
    }
    Ok(value)
}

/// Write `value` as exactly `digits` zero-padded lowercase hex characters.
///
/// Bits above `4 * digits` are dropped. Returns the number of bytes written
/// (always `digits`).
///
/// # Example
///
/// ```
/// use macropad_proto::hex::encode_hex;
///
/// let mut buf = [0u8; 6];
/// let len = encode_hex(0x01057f, 6, &mut buf).unwrap();
/// assert_eq!(&buf[..len], b"01057f");
/// ```
pub fn encode_hex(value: u32, digits: usize, buf: &mut [u8]) -> Result<usize, ProtocolError> {
    if digits > MAX_HEX_DIGITS {
        return Err(ProtocolError::MalformedInstruction);
    }
    let out = buf
        .get_mut(..digits)
        .ok_or(ProtocolError::BufferTooSmall)?;

    for (i, slot) in out.iter_mut().enumerate() {
        let shift = 4 * (digits - 1 - i);
        *slot = HEX_DIGITS[((value >> shift) & 0xF) as usize];
    }
    Ok(digits)
}

/// Write a u8 as 2 lowercase hex digits.
///
/// # Panics
///
/// Panics if `buf.len() < 2`.
#[inline]
pub fn write_hex_u8(buf: &mut [u8], value: u8) -> usize {
    debug_assert!(buf.len() >= 2, "buffer too small for hex u8");
    buf[0] = HEX_DIGITS[(value >> 4) as usize];
    buf[1] = HEX_DIGITS[(value & 0xF) as usize];
    2
}

/// Decode a 2-character hex byte.
#[inline]
pub fn decode_hex_u8(chars: &[u8]) -> Result<u8, ProtocolError> {
    decode_hex(chars, 2).map(|v| v as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hex_digit_value() {
        assert_eq!(hex_digit_value(b'0'), Ok(0));
        assert_eq!(hex_digit_value(b'9'), Ok(9));
        assert_eq!(hex_digit_value(b'a'), Ok(10));
        assert_eq!(hex_digit_value(b'F'), Ok(15));
        assert_eq!(hex_digit_value(b'g'), Err(ProtocolError::InvalidDigit));
        assert_eq!(hex_digit_value(b' '), Err(ProtocolError::InvalidDigit));
    }

    #[test]
    fn test_decode_hex_mixed_case() {
        assert_eq!(decode_hex(b"aBcD", 4), Ok(0xABCD));
        assert_eq!(decode_hex(b"00ff", 4), Ok(0x00FF));
    }

    #[test]
    fn test_decode_hex_stops_on_bad_digit() {
        assert_eq!(decode_hex(b"01gg7f", 6), Err(ProtocolError::InvalidDigit));
    }

    #[test]
    fn test_decode_hex_ignores_trailing() {
        assert_eq!(decode_hex(b"0105hello", 4), Ok(0x0105));
    }

    #[test]
    fn test_decode_hex_too_short() {
        assert_eq!(
            decode_hex(b"010", 4),
            Err(ProtocolError::MalformedInstruction)
        );
    }

    #[test]
    fn test_encode_hex_zero_padded() {
        let mut buf = [0u8; 8];
        let len = encode_hex(0x5, 4, &mut buf).unwrap();
        assert_eq!(&buf[..len], b"0005");

        let len = encode_hex(0xDEADBEEF, 8, &mut buf).unwrap();
        assert_eq!(&buf[..len], b"deadbeef");
    }

    #[test]
    fn test_encode_hex_truncates_high_bits() {
        let mut buf = [0u8; 2];
        let len = encode_hex(0x1ff, 2, &mut buf).unwrap();
        assert_eq!(&buf[..len], b"ff");
    }

    #[test]
    fn test_encode_hex_buffer_too_small() {
        let mut buf = [0u8; 3];
        assert_eq!(
            encode_hex(0, 4, &mut buf),
            Err(ProtocolError::BufferTooSmall)
        );
    }

    #[test]
    fn test_every_byte_round_trips() {
        let mut buf = [0u8; 2];
        for b in 0..=u8::MAX {
            write_hex_u8(&mut buf, b);
            assert_eq!(decode_hex_u8(&buf), Ok(b));
        }
    }

    proptest! {
        #[test]
        fn prop_round_trip(digits in 1usize..=8, raw in any::<u32>()) {
            let value = if digits == 8 { raw } else { raw & ((1u32 << (4 * digits)) - 1) };
            let mut buf = [0u8; 8];
            let len = encode_hex(value, digits, &mut buf).unwrap();
            prop_assert_eq!(decode_hex(&buf[..len], digits), Ok(value));
        }
    }
}
