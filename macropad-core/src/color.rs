//! Key LED colours.

use macropad_proto::hex::decode_hex;
use macropad_proto::ProtocolError;

/// 24-bit RGB colour of a key LED.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value; the top byte is ignored.
    #[must_use]
    pub const fn from_packed(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Packed `0xRRGGBB` value.
    #[must_use]
    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Parse `rrggbb` (optionally prefixed with `#`), either case.
    pub fn parse_hex(text: &[u8]) -> Result<Self, ProtocolError> {
        let text = text.strip_prefix(b"#").unwrap_or(text);
        if text.len() != 6 {
            return Err(ProtocolError::MalformedInstruction);
        }
        decode_hex(text, 6).map(Self::from_packed)
    }

    /// Colour-wheel lookup: 0..=255 sweeps red → green → blue → red.
    #[must_use]
    pub const fn wheel(position: u8) -> Self {
        let pos = 255 - position;
        if pos < 85 {
            Self::new(255 - pos * 3, 0, pos * 3)
        } else if pos < 170 {
            let pos = pos - 85;
            Self::new(0, pos * 3, 255 - pos * 3)
        } else {
            let pos = pos - 170;
            Self::new(pos * 3, 255 - pos * 3, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_round_trip() {
        let c = Rgb::new(0x12, 0x34, 0x56);
        assert_eq!(c.packed(), 0x123456);
        assert_eq!(Rgb::from_packed(0xFF123456), c);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::parse_hex(b"ff8000"), Ok(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::parse_hex(b"#00FF7f"), Ok(Rgb::new(0, 255, 127)));
        assert_eq!(
            Rgb::parse_hex(b"fff"),
            Err(ProtocolError::MalformedInstruction)
        );
        assert_eq!(Rgb::parse_hex(b"zz0000"), Err(ProtocolError::InvalidDigit));
    }

    #[test]
    fn test_wheel_sweep() {
        assert_eq!(Rgb::wheel(0), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::wheel(85), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::wheel(170), Rgb::new(0, 0, 255));
        assert_eq!(Rgb::wheel(40), Rgb::new(135, 120, 0));
    }
}
