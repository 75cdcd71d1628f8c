//! The wire message exchanged in both directions over the serial link.
//!
//! # Frame format
//!
//! ```text
//! <header hex digits><extra bytes>\n
//! ```
//!
//! The header is 4, 6 or 8 lowercase hex digits (see [`HeaderWidth`]); its
//! width is fixed per opcode. Everything between the header and the newline
//! is the verbatim `extra` payload. On input a trailing `\r` is tolerated and
//! the debug envelope `[TAG::0x<header>]<extra>` is unwrapped, so frames
//! produced by [`Instruction::sendf`] with [`DEBUG_TEMPLATE`] decode through
//! the same path.

use heapless::Vec;

use crate::error::{ProtocolError, SendError};
use crate::hex::{decode_hex_u8, write_hex_u8};
use crate::opcode::{HeaderWidth, Opcode};

/// Header width of a standard `code, arg1, arg2` instruction.
pub const DEFAULT_INSTRUCTION_HEX_DIGITS: usize = HeaderWidth::Standard.digits();

/// Byte terminating every frame. Never a valid hex digit.
pub const FRAME_DELIMITER: u8 = b'\n';

/// Maximum length of the free-form payload.
pub const MAX_EXTRA_LEN: usize = 48;

/// Maximum length of an encoded frame, delimiter and debug envelope included.
pub const MAX_FRAME_LEN: usize = 80;

/// Human-readable framing understood by [`Instruction::decode`].
pub const DEBUG_TEMPLATE: &str = "[ARD::0x{header}]{extra}";

/// Separator between the tag and the header inside a debug envelope.
const ENVELOPE_MARKER: &[u8] = b"::0x";

/// A single protocol message.
///
/// Instructions are plain values: built from incoming bytes or from field
/// values, sent, and dropped.
///
/// # Example
///
/// ```
/// use macropad_proto::Instruction;
///
/// let event = Instruction::from((0x01, 0x05, 0x7F));
/// let frame = event.encode_frame().unwrap();
/// assert_eq!(&frame[..], b"01057f\n");
///
/// let decoded = Instruction::decode(&frame).unwrap();
/// assert_eq!((decoded.code, decoded.arg1, decoded.arg2), (1, 5, 127));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instruction {
    pub code: u8,
    pub arg1: u8,
    pub arg2: u8,
    pub arg3: u8,
    pub extra: Vec<u8, MAX_EXTRA_LEN>,
}

impl Instruction {
    /// Create an instruction from explicit field values, without payload.
    #[must_use]
    pub const fn new(code: u8, arg1: u8, arg2: u8, arg3: u8) -> Self {
        Self {
            code,
            arg1,
            arg2,
            arg3,
            extra: Vec::new(),
        }
    }

    /// Attach a free-form payload.
    pub fn with_extra(mut self, extra: &[u8]) -> Result<Self, ProtocolError> {
        self.extra = Vec::from_slice(extra).map_err(|_| ProtocolError::PayloadTooLong)?;
        Ok(self)
    }

    /// Decode a raw frame, choosing the header width from its opcode.
    ///
    /// Unknown opcodes are decoded with the standard 6-digit header.
    pub fn decode(raw: &[u8]) -> Result<Self, ProtocolError> {
        let body = strip_line_ending(raw);
        let code_digits = match split_envelope(body)? {
            Some((header, _)) => header,
            None => body,
        };
        let code = decode_header_byte(code_digits, 0)?;
        Self::decode_body(body, Opcode::width_for_code(code))
    }

    /// Decode a raw frame with a caller-chosen header width.
    pub fn decode_with_width(raw: &[u8], width: HeaderWidth) -> Result<Self, ProtocolError> {
        Self::decode_body(strip_line_ending(raw), width)
    }

    fn decode_body(body: &[u8], width: HeaderWidth) -> Result<Self, ProtocolError> {
        let (header, extra) = match split_envelope(body)? {
            Some((header, extra)) => {
                if header.len() != width.digits() {
                    return Err(ProtocolError::MalformedInstruction);
                }
                (header, extra)
            }
            None => {
                if body.len() < width.digits() {
                    return Err(ProtocolError::MalformedInstruction);
                }
                body.split_at(width.digits())
            }
        };

        let mut fields = [0u8; 4];
        for (i, field) in fields.iter_mut().take(width.fields()).enumerate() {
            *field = decode_header_byte(header, i)?;
        }

        // Host text length is not bounded; keep what fits
        let extra = &extra[..extra.len().min(MAX_EXTRA_LEN)];
        Self::new(fields[0], fields[1], fields[2], fields[3]).with_extra(extra)
    }

    /// Pack `code` and `arg1` into one word, `code` in the high byte.
    #[inline]
    #[must_use]
    pub const fn serialize(&self) -> u16 {
        ((self.code as u16) << 8) | self.arg1 as u16
    }

    /// The opcode, if this code is a known one.
    #[inline]
    pub fn opcode(&self) -> Result<Opcode, u8> {
        Opcode::try_from(self.code)
    }

    /// Header width used when encoding this instruction.
    ///
    /// Always the width [`decode`](Self::decode) picks for the same code, so
    /// unknown opcodes use [`HeaderWidth::Standard`].
    #[inline]
    #[must_use]
    pub fn header_width(&self) -> HeaderWidth {
        Opcode::width_for_code(self.code)
    }

    /// The header width, or `MalformedInstruction` if a non-zero field
    /// would not be transmitted.
    fn checked_width(&self) -> Result<HeaderWidth, ProtocolError> {
        let width = self.header_width();
        if self.fields()[width.fields()..].iter().any(|&f| f != 0) {
            return Err(ProtocolError::MalformedInstruction);
        }
        Ok(width)
    }

    /// The payload as text, if it is valid UTF-8.
    #[must_use]
    pub fn extra_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.extra).ok()
    }

    fn fields(&self) -> [u8; 4] {
        [self.code, self.arg1, self.arg2, self.arg3]
    }

    /// Write the header as hex digits, returning the number of bytes written.
    fn write_header(&self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        let width = self.checked_width()?;
        if buf.len() < width.digits() {
            return Err(ProtocolError::BufferTooSmall);
        }
        let mut pos = 0;
        for field in self.fields().iter().take(width.fields()) {
            pos += write_hex_u8(&mut buf[pos..], *field);
        }
        Ok(pos)
    }

    /// Encode the full frame (header, payload, delimiter) into `buf`.
    ///
    /// Returns the number of bytes written. Fails with
    /// `MalformedInstruction` when a non-zero field lies beyond the opcode's
    /// header width.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        let digits = self.checked_width()?.digits();
        let total = digits + self.extra.len() + 1;
        if buf.len() < total {
            return Err(ProtocolError::BufferTooSmall);
        }

        let mut pos = self.write_header(buf)?;
        buf[pos..pos + self.extra.len()].copy_from_slice(&self.extra);
        pos += self.extra.len();
        buf[pos] = FRAME_DELIMITER;
        Ok(pos + 1)
    }

    /// Encode the full frame into a `heapless::Vec`.
    pub fn encode_frame(&self) -> Result<Vec<u8, MAX_FRAME_LEN>, ProtocolError> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = self.encode(&mut buf)?;
        Vec::from_slice(&buf[..len]).map_err(|_| ProtocolError::BufferTooSmall)
    }

    /// Write the encoded frame to `writer`.
    pub fn send<W: embedded_io::Write>(&self, writer: &mut W) -> Result<(), SendError<W::Error>> {
        let frame = self.encode_frame()?;
        writer.write_all(&frame).map_err(SendError::Write)
    }

    /// Expand a text template with this instruction's fields.
    ///
    /// Placeholders: `{code}`, `{arg1}`, `{arg2}`, `{arg3}` (two hex digits
    /// each), `{header}` (the full header) and `{extra}` (payload verbatim).
    /// `{{` and `}}` produce literal braces. A newline is appended when the
    /// template does not end with one.
    pub fn format(&self, template: &str) -> Result<Vec<u8, MAX_FRAME_LEN>, ProtocolError> {
        let mut out: Vec<u8, MAX_FRAME_LEN> = Vec::new();
        let bytes = template.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' if bytes.get(i + 1) == Some(&b'{') => {
                    push_all(&mut out, b"{")?;
                    i += 2;
                }
                b'}' if bytes.get(i + 1) == Some(&b'}') => {
                    push_all(&mut out, b"}")?;
                    i += 2;
                }
                b'{' => {
                    let close = bytes[i..]
                        .iter()
                        .position(|&b| b == b'}')
                        .ok_or(ProtocolError::MalformedTemplate)?;
                    self.expand_placeholder(&bytes[i + 1..i + close], &mut out)?;
                    i += close + 1;
                }
                b'}' => return Err(ProtocolError::MalformedTemplate),
                b => {
                    push_all(&mut out, &[b])?;
                    i += 1;
                }
            }
        }

        if out.last() != Some(&FRAME_DELIMITER) {
            push_all(&mut out, &[FRAME_DELIMITER])?;
        }
        Ok(out)
    }

    fn expand_placeholder(
        &self,
        name: &[u8],
        out: &mut Vec<u8, MAX_FRAME_LEN>,
    ) -> Result<(), ProtocolError> {
        let mut tmp = [0u8; 8];
        let field = match name {
            b"code" => self.code,
            b"arg1" => self.arg1,
            b"arg2" => self.arg2,
            b"arg3" => self.arg3,
            b"header" => {
                let len = self.write_header(&mut tmp)?;
                return push_all(out, &tmp[..len]);
            }
            b"extra" => return push_all(out, &self.extra),
            _ => return Err(ProtocolError::MalformedTemplate),
        };
        let len = write_hex_u8(&mut tmp, field);
        push_all(out, &tmp[..len])
    }

    /// Write a frame built from `template` (see [`Instruction::format`]).
    pub fn sendf<W: embedded_io::Write>(
        &self,
        template: &str,
        writer: &mut W,
    ) -> Result<(), SendError<W::Error>> {
        let frame = self.format(template)?;
        writer.write_all(&frame).map_err(SendError::Write)
    }
}

impl From<(u8,)> for Instruction {
    fn from((code,): (u8,)) -> Self {
        Self::new(code, 0, 0, 0)
    }
}

impl From<(u8, u8)> for Instruction {
    fn from((code, arg1): (u8, u8)) -> Self {
        Self::new(code, arg1, 0, 0)
    }
}

impl From<(u8, u8, u8)> for Instruction {
    fn from((code, arg1, arg2): (u8, u8, u8)) -> Self {
        Self::new(code, arg1, arg2, 0)
    }
}

impl From<(u8, u8, u8, u8)> for Instruction {
    fn from((code, arg1, arg2, arg3): (u8, u8, u8, u8)) -> Self {
        Self::new(code, arg1, arg2, arg3)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Instruction {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Instruction {{ code: {=u8:#04x}, arg1: {=u8}, arg2: {=u8}, arg3: {=u8}, extra: {=[u8]:a} }}",
            self.code,
            self.arg1,
            self.arg2,
            self.arg3,
            &self.extra[..]
        )
    }
}

#[inline]
fn push_all(out: &mut Vec<u8, MAX_FRAME_LEN>, bytes: &[u8]) -> Result<(), ProtocolError> {
    out.extend_from_slice(bytes)
        .map_err(|_| ProtocolError::BufferTooSmall)
}

/// Decode header byte `index` (two hex digits). Any failure inside the
/// header region is a malformed instruction.
#[inline]
fn decode_header_byte(header: &[u8], index: usize) -> Result<u8, ProtocolError> {
    let digits = header
        .get(index * 2..index * 2 + 2)
        .ok_or(ProtocolError::MalformedInstruction)?;
    decode_hex_u8(digits).map_err(|_| ProtocolError::MalformedInstruction)
}

/// Strip trailing CR and/or LF from a frame.
#[inline]
fn strip_line_ending(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    if end > 0 && line[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && line[end - 1] == b'\r' {
        end -= 1;
    }
    &line[..end]
}

/// Split `[TAG::0x<header>]<extra>` into header and extra.
///
/// Returns `Ok(None)` for frames without an envelope.
fn split_envelope(body: &[u8]) -> Result<Option<(&[u8], &[u8])>, ProtocolError> {
    if body.first() != Some(&b'[') {
        return Ok(None);
    }
    let close = body
        .iter()
        .position(|&b| b == b']')
        .ok_or(ProtocolError::MalformedInstruction)?;
    let inner = &body[1..close];
    let marker = inner
        .windows(ENVELOPE_MARKER.len())
        .position(|w| w == ENVELOPE_MARKER)
        .ok_or(ProtocolError::MalformedInstruction)?;
    Ok(Some((&inner[marker + ENVELOPE_MARKER.len()..], &body[close + 1..])))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec as StdVec;

    struct Sink(StdVec<u8>);

    impl embedded_io::ErrorType for Sink {
        type Error = core::convert::Infallible;
    }

    impl embedded_io::Write for Sink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_key_event_wire_text() {
        let event = Instruction::from((0x01, 0x05, 0x7F));
        let mut buf = [0u8; 16];
        let len = event.encode(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"01057f\n");

        let decoded = Instruction::decode(&buf[..len]).unwrap();
        assert_eq!(decoded.code, 1);
        assert_eq!(decoded.arg1, 5);
        assert_eq!(decoded.arg2, 127);
        assert!(decoded.extra.is_empty());
    }

    #[test]
    fn test_standard_fields_survive_encoding() {
        for &(code, arg1, arg2) in &[(0x01, 0, 0), (0x01, 11, 255), (0x0F, 3, 0x80), (0x0D, 0xFF, 0)] {
            let frame = Instruction::from((code, arg1, arg2)).encode_frame().unwrap();
            let decoded =
                Instruction::decode_with_width(&frame, HeaderWidth::Standard).unwrap();
            assert_eq!((decoded.code, decoded.arg1, decoded.arg2), (code, arg1, arg2));
        }
    }

    #[test]
    fn test_decode_extra_verbatim() {
        let decoded = Instruction::decode(b"0f03001a2B3c\r\n").unwrap();
        assert_eq!(decoded.opcode(), Ok(Opcode::KeyColor));
        assert_eq!(decoded.arg1, 3);
        assert_eq!(&decoded.extra[..], b"1a2B3c");
    }

    #[test]
    fn test_decode_full_width_by_opcode() {
        let decoded = Instruction::decode(b"0e020101Hello").unwrap();
        assert_eq!(decoded.opcode(), Ok(Opcode::DisplayText));
        assert_eq!((decoded.arg1, decoded.arg2, decoded.arg3), (2, 1, 1));
        assert_eq!(decoded.extra_str(), Some("Hello"));
    }

    #[test]
    fn test_decode_short_width() {
        let decoded = Instruction::decode_with_width(b"0b01", HeaderWidth::Short).unwrap();
        assert_eq!((decoded.code, decoded.arg1, decoded.arg2), (0x0B, 1, 0));
    }

    #[test]
    fn test_decode_too_short() {
        assert_eq!(
            Instruction::decode(b"0105"),
            Err(ProtocolError::MalformedInstruction)
        );
        assert_eq!(
            Instruction::decode(b""),
            Err(ProtocolError::MalformedInstruction)
        );
    }

    #[test]
    fn test_decode_bad_digit_in_header() {
        assert_eq!(
            Instruction::decode(b"01gg7f"),
            Err(ProtocolError::MalformedInstruction)
        );
    }

    #[test]
    fn test_decode_non_hex_after_header_is_extra() {
        let decoded = Instruction::decode(b"01057fzz").unwrap();
        assert_eq!(&decoded.extra[..], b"zz");
    }

    #[test]
    fn test_long_payload_is_truncated() {
        let mut raw = StdVec::from(&b"0e010000"[..]);
        raw.extend(core::iter::repeat(b'x').take(MAX_EXTRA_LEN + 2));
        raw.push(b'\n');

        let decoded = Instruction::decode(&raw).unwrap();
        assert_eq!((decoded.code, decoded.arg1), (0x0E, 1));
        assert_eq!(decoded.extra.len(), MAX_EXTRA_LEN);
        assert!(decoded.extra.iter().all(|&b| b == b'x'));
    }

    #[test]
    fn test_with_extra_rejects_oversized_payload() {
        let payload = [b'x'; MAX_EXTRA_LEN + 1];
        assert_eq!(
            Instruction::new(0x0E, 0, 0, 0).with_extra(&payload),
            Err(ProtocolError::PayloadTooLong)
        );
    }

    #[test]
    fn test_serialize_packs_code_and_arg1() {
        let inst = Instruction::from((0x0F, 0x0A));
        assert_eq!(inst.serialize(), 0x0F0A);
        assert_eq!(Instruction::from((0xAB, 0xCD)).serialize(), (0xAB << 8) | 0xCD);
    }

    #[test]
    fn test_omitted_fields_default_to_zero() {
        let inst = Instruction::from((0x02,));
        assert_eq!(inst, Instruction::new(0x02, 0, 0, 0));
    }

    #[test]
    fn test_encode_uses_opcode_width() {
        let key_down = Instruction::from((0x02, 0x07));
        assert_eq!(&key_down.encode_frame().unwrap()[..], b"0207\n");

        let text = Instruction::new(0x0E, 1, 0, 0).with_extra(b"hi").unwrap();
        assert_eq!(&text.encode_frame().unwrap()[..], b"0e010000hi\n");
    }

    #[test]
    fn test_unknown_opcode_encodes_as_decoded() {
        let inst = Instruction::new(0x40, 1, 2, 0);
        assert_eq!(inst.header_width(), HeaderWidth::Standard);
        let frame = inst.encode_frame().unwrap();
        assert_eq!(&frame[..], b"400102\n");
        assert_eq!(Instruction::decode(&frame).unwrap(), inst);
    }

    #[test]
    fn test_field_beyond_width_is_malformed() {
        assert_eq!(
            Instruction::new(0x40, 1, 2, 3).encode_frame(),
            Err(ProtocolError::MalformedInstruction)
        );
        assert_eq!(
            Instruction::from((0x02, 5, 9)).encode_frame(),
            Err(ProtocolError::MalformedInstruction)
        );
        assert_eq!(
            Instruction::from((0x02, 5, 9)).format("{header}"),
            Err(ProtocolError::MalformedInstruction)
        );

        let mut sink = Sink(StdVec::new());
        assert_eq!(
            Instruction::from((0x02, 5, 9)).send(&mut sink),
            Err(SendError::Encode(ProtocolError::MalformedInstruction))
        );
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut buf = [0u8; 6];
        assert_eq!(
            Instruction::from((0x01, 0x05, 0x7F)).encode(&mut buf),
            Err(ProtocolError::BufferTooSmall)
        );
    }

    #[test]
    fn test_send_writes_frame() {
        let mut sink = Sink(StdVec::new());
        Instruction::from((0x01, 0x0B, 0xFF)).send(&mut sink).unwrap();
        assert_eq!(sink.0, b"010bff\n");
    }

    #[test]
    fn test_sendf_debug_template_decodes() {
        let mut sink = Sink(StdVec::new());
        let inst = Instruction::new(0x0E, 3, 1, 0).with_extra(b"menu").unwrap();
        inst.sendf(DEBUG_TEMPLATE, &mut sink).unwrap();
        assert_eq!(sink.0, b"[ARD::0x0e030100]menu\n");

        let decoded = Instruction::decode(&sink.0).unwrap();
        assert_eq!(decoded, inst);
    }

    #[test]
    fn test_format_fields_and_escapes() {
        let inst = Instruction::from((0x01, 0x05, 0x7F));
        let out = inst.format("{{key}} {arg1}:{arg2}\n").unwrap();
        assert_eq!(&out[..], b"{key} 05:7f\n");

        let out = inst.format("{code}{arg1}{arg2}").unwrap();
        assert_eq!(&out[..], b"01057f\n");
        assert_eq!(Instruction::decode(&out).unwrap(), inst);
    }

    #[test]
    fn test_format_rejects_unknown_placeholder() {
        let inst = Instruction::from((0x01,));
        assert_eq!(inst.format("{nope}"), Err(ProtocolError::MalformedTemplate));
        assert_eq!(inst.format("{code"), Err(ProtocolError::MalformedTemplate));
        assert_eq!(inst.format("}"), Err(ProtocolError::MalformedTemplate));
    }

    #[test]
    fn test_envelope_width_mismatch() {
        assert_eq!(
            Instruction::decode(b"[MTH::0x0105]"),
            Err(ProtocolError::MalformedInstruction)
        );
        assert_eq!(
            Instruction::decode(b"[MTH::0x01057f"),
            Err(ProtocolError::MalformedInstruction)
        );
    }
}
