//! Opcode table and per-opcode header widths.

/// Number of hex digits in a header.
///
/// Each header byte is two hex digits, filled left to right into
/// `code`, `arg1`, `arg2`, `arg3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeaderWidth {
    /// `code`, `arg1` (4 digits).
    Short,
    /// `code`, `arg1`, `arg2` (6 digits).
    Standard,
    /// `code`, `arg1`, `arg2`, `arg3` (8 digits).
    Full,
}

impl HeaderWidth {
    /// Number of hex digits in the header.
    #[inline]
    #[must_use]
    pub const fn digits(self) -> usize {
        self.fields() * 2
    }

    /// Number of binary fields carried by the header.
    #[inline]
    #[must_use]
    pub const fn fields(self) -> usize {
        match self {
            Self::Short => 2,
            Self::Standard => 3,
            Self::Full => 4,
        }
    }
}

/// Known instruction codes.
///
/// Device-to-host events sit at the bottom of the range, host-to-device
/// commands at the top (`0x00`, `0x0E` and `0x0F` match the host tool's
/// clipboard, OLED and key colour codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    /// Clipboard slot request: `arg1` key index, `arg2` a
    /// [`ClipboardCommand`].
    Clipboard = 0x00,
    /// Key released: `arg1` key index, `arg2` quantized hold duration.
    KeyEvent = 0x01,
    /// Key pressed (only for keys that opt in): `arg1` key index.
    KeyDown = 0x02,
    /// Encoder switch pressed on a menu: `arg1` selected row.
    MenuSelect = 0x03,
    /// Show (`arg1 != 0`) or hide (`arg1 == 0`) the menu.
    MenuShow = 0x0B,
    /// Set menu row `arg1` to `extra`; `arg2 != 0` clears the menu first.
    MenuSetRow = 0x0C,
    /// Move the menu selection: `arg2 == 0` relative (signed `arg1`),
    /// otherwise absolute row `arg1`.
    MenuNavigate = 0x0D,
    /// Set display row `arg1` to `extra`; `arg2 != 0` inverted,
    /// `arg3 != 0` clears all rows first.
    DisplayText = 0x0E,
    /// Set key `arg1` colour from `extra` (`rrggbb`) or, without extra,
    /// from colour-wheel position `arg2`.
    KeyColor = 0x0F,
}

impl Opcode {
    /// Header width used by frames carrying this opcode.
    #[must_use]
    pub const fn header_width(self) -> HeaderWidth {
        match self {
            Self::KeyDown | Self::MenuSelect | Self::MenuShow => HeaderWidth::Short,
            Self::Clipboard
            | Self::KeyEvent
            | Self::MenuSetRow
            | Self::MenuNavigate
            | Self::KeyColor => HeaderWidth::Standard,
            Self::DisplayText => HeaderWidth::Full,
        }
    }

    /// Header width for a raw code; unknown codes use [`HeaderWidth::Standard`].
    #[must_use]
    pub fn width_for_code(code: u8) -> HeaderWidth {
        Opcode::try_from(code)
            .map(Opcode::header_width)
            .unwrap_or(HeaderWidth::Standard)
    }

    /// Whether the device accepts this opcode from the host.
    #[must_use]
    pub const fn is_host_command(self) -> bool {
        !matches!(
            self,
            Self::Clipboard | Self::KeyEvent | Self::KeyDown | Self::MenuSelect
        )
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0x00 => Self::Clipboard,
            0x01 => Self::KeyEvent,
            0x02 => Self::KeyDown,
            0x03 => Self::MenuSelect,
            0x0B => Self::MenuShow,
            0x0C => Self::MenuSetRow,
            0x0D => Self::MenuNavigate,
            0x0E => Self::DisplayText,
            0x0F => Self::KeyColor,
            other => return Err(other),
        })
    }
}

impl From<Opcode> for u8 {
    #[inline]
    fn from(op: Opcode) -> Self {
        op as u8
    }
}

/// What a clipboard key asks the host to do with its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClipboardCommand {
    /// Arm the slot so the host stores its clipboard into it.
    Prime = 0x01,
    /// Disarm the slot; the host shows the slot's contents.
    CancelPrime = 0x02,
    /// Ask the host for the slot's contents.
    RequestClip = 0x03,
}

impl TryFrom<u8> for ClipboardCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => Self::Prime,
            0x02 => Self::CancelPrime,
            0x03 => Self::RequestClip,
            other => return Err(other),
        })
    }
}

impl From<ClipboardCommand> for u8 {
    #[inline]
    fn from(command: ClipboardCommand) -> Self {
        command as u8
    }
}
