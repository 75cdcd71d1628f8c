//! Per-key press/release state machine and hold-duration quantization.

use core::fmt;

use macropad_proto::{ClipboardCommand, Instruction, Opcode};

use crate::color::Rgb;

/// Number of keys on the pad.
pub const KEY_COUNT: usize = 12;

/// Hold time at which a [`KeyKind::Clipboard`] key primes its slot.
pub const CLIPBOARD_HOLD_MS: u32 = 500;

/// What a key reports besides its release event.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyKind {
    /// Reports only on release, with the hold duration.
    #[default]
    Macro,
    /// Also reports a [`Opcode::KeyDown`] as soon as the key goes down.
    Momentary,
    /// Owns a host clipboard slot and reports [`Opcode::Clipboard`] on
    /// release instead of a key event.
    ///
    /// Holding for [`CLIPBOARD_HOLD_MS`] or longer primes the slot. A tap
    /// cancels a primed slot, otherwise it requests the slot's contents.
    Clipboard,
}

impl KeyKind {
    fn press_event(self, index: u8) -> Option<Instruction> {
        match self {
            Self::Macro | Self::Clipboard => None,
            Self::Momentary => Some(Instruction::from((Opcode::KeyDown as u8, index))),
        }
    }
}

/// State machine misuse, usually a sign that the input was not debounced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyError {
    /// `on_press` on a pressed key or `on_release` on an idle key.
    InvalidTransition { index: u8, pressed: bool },
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { index, pressed } => write!(
                f,
                "invalid transition on key {} (already {})",
                index,
                if *pressed { "pressed" } else { "idle" }
            ),
        }
    }
}

/// Map a hold duration in milliseconds onto a byte.
///
/// Piecewise, monotonic and saturating:
///
/// | hold            | value                          | resolution |
/// |-----------------|--------------------------------|------------|
/// | 0 – 999 ms      | `ms / 10` (0..=99)             | 10 ms      |
/// | 1 – 10 s        | `100 + (ms - 1000) / 60`       | 60 ms      |
/// | 10 – 20 s       | `250 + (ms - 10000) / 2000`    | 2 s        |
/// | 20 s and longer | 255                            |            |
#[must_use]
pub const fn quantize_duration(ms: u32) -> u8 {
    if ms < 1_000 {
        (ms / 10) as u8
    } else if ms < 10_000 {
        (100 + (ms - 1_000) / 60) as u8
    } else {
        let value = 250 + (ms - 10_000) / 2_000;
        if value > 255 {
            255
        } else {
            value as u8
        }
    }
}

/// One physical key.
///
/// Two states, `Idle` and `Pressed`. Timing uses the wrapping millisecond
/// clock, so a press that spans a clock wrap still measures correctly as
/// long as it is shorter than the wrap period.
#[derive(Debug, Clone)]
pub struct KeyState {
    index: u8,
    /// Colour shown while the key is idle.
    pub color: Rgb,
    kind: KeyKind,
    pressed: bool,
    primed: bool,
    press_started_at: u32,
    hold_duration: u32,
    last_sent_duration: u8,
}

impl KeyState {
    #[must_use]
    pub const fn new(index: u8, kind: KeyKind, color: Rgb) -> Self {
        Self {
            index,
            color,
            kind,
            pressed: false,
            primed: false,
            press_started_at: 0,
            hold_duration: 0,
            last_sent_duration: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn index(&self) -> u8 {
        self.index
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Time held so far, as of the last `tick`, or 0 when idle.
    #[inline]
    #[must_use]
    pub const fn hold_duration(&self) -> u32 {
        self.hold_duration
    }

    /// Quantized hold duration of the last release.
    #[inline]
    #[must_use]
    pub const fn last_sent_duration(&self) -> u8 {
        self.last_sent_duration
    }

    /// Whether this clipboard key's slot is primed.
    #[inline]
    #[must_use]
    pub const fn is_primed(&self) -> bool {
        self.primed
    }

    /// Idle → Pressed.
    ///
    /// Returns the instruction to send right away, if this kind of key
    /// reports presses.
    pub fn on_press(&mut self, now: u32) -> Result<Option<Instruction>, KeyError> {
        if self.pressed {
            return Err(self.invalid_transition());
        }
        self.pressed = true;
        self.press_started_at = now;
        self.hold_duration = 0;
        Ok(self.kind.press_event(self.index))
    }

    /// Pressed → Idle, producing the event for the host.
    pub fn on_release(&mut self, now: u32) -> Result<Instruction, KeyError> {
        if !self.pressed {
            return Err(self.invalid_transition());
        }
        self.hold_duration = now.wrapping_sub(self.press_started_at);
        let quantized = quantize_duration(self.hold_duration);
        let event = match self.kind {
            KeyKind::Clipboard => {
                let command = self.clipboard_command();
                Instruction::from((Opcode::Clipboard as u8, self.index, command as u8))
            }
            KeyKind::Macro | KeyKind::Momentary => {
                Instruction::from((Opcode::KeyEvent as u8, self.index, quantized))
            }
        };

        self.last_sent_duration = quantized;
        self.pressed = false;
        self.hold_duration = 0;
        Ok(event)
    }

    /// Refresh the running hold duration of a pressed key.
    pub fn tick(&mut self, now: u32) {
        if self.pressed {
            self.hold_duration = now.wrapping_sub(self.press_started_at);
        }
    }

    /// Force the pressed flag to `pressed` without emitting anything.
    ///
    /// Used to recover after a transition error. Forcing `pressed` restarts
    /// the hold timer at `now`.
    pub fn resync(&mut self, pressed: bool, now: u32) {
        if pressed {
            self.press_started_at = now;
        }
        self.pressed = pressed;
        self.hold_duration = 0;
    }

    /// Colour to show this tick: `highlight` while held, else the key colour.
    #[inline]
    #[must_use]
    pub const fn display_color(&self, highlight: Rgb) -> Rgb {
        if self.pressed {
            highlight
        } else {
            self.color
        }
    }

    fn clipboard_command(&mut self) -> ClipboardCommand {
        if self.hold_duration >= CLIPBOARD_HOLD_MS {
            self.primed = true;
            ClipboardCommand::Prime
        } else if self.primed {
            self.primed = false;
            ClipboardCommand::CancelPrime
        } else {
            ClipboardCommand::RequestClip
        }
    }

    fn invalid_transition(&self) -> KeyError {
        KeyError::InvalidTransition {
            index: self.index,
            pressed: self.pressed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(index: u8) -> KeyState {
        KeyState::new(index, KeyKind::Macro, Rgb::OFF)
    }

    #[test]
    fn test_press_release_emits_one_event() {
        let mut k = key(7);
        assert_eq!(k.on_press(1_000), Ok(None));
        assert!(k.is_pressed());

        let event = k.on_release(1_250).unwrap();
        assert_eq!(event.code, 0x01);
        assert_eq!(event.arg1, 7);
        assert_eq!(event.arg2, 25);
        assert!(!k.is_pressed());
        assert_eq!(k.last_sent_duration(), 25);
        assert_eq!(k.hold_duration(), 0);
    }

    #[test]
    fn test_release_while_idle_fails() {
        let mut k = key(3);
        assert_eq!(
            k.on_release(10),
            Err(KeyError::InvalidTransition { index: 3, pressed: false })
        );
        assert!(!k.is_pressed());
    }

    #[test]
    fn test_double_press_fails() {
        let mut k = key(0);
        k.on_press(0).unwrap();
        assert_eq!(
            k.on_press(5),
            Err(KeyError::InvalidTransition { index: 0, pressed: true })
        );
        // Still usable afterwards
        assert!(k.on_release(100).is_ok());
    }

    #[test]
    fn test_duration_is_monotonic_and_saturates() {
        let mut previous = 0u8;
        let mut elapsed = 0u32;
        while elapsed < 40_000 {
            let mut k = key(1);
            k.on_press(500).unwrap();
            let q = k.on_release(500 + elapsed).unwrap().arg2;
            assert!(q >= previous, "not monotonic at {} ms", elapsed);
            previous = q;
            elapsed += 7;
        }
        assert_eq!(previous, 255);
    }

    #[test]
    fn test_quantize_boundaries() {
        assert_eq!(quantize_duration(0), 0);
        assert_eq!(quantize_duration(999), 99);
        assert_eq!(quantize_duration(1_000), 100);
        assert_eq!(quantize_duration(9_999), 249);
        assert_eq!(quantize_duration(10_000), 250);
        assert_eq!(quantize_duration(20_000), 255);
        assert_eq!(quantize_duration(u32::MAX), 255);
    }

    #[test]
    fn test_release_across_clock_wrap() {
        let mut k = key(11);
        k.on_press(u32::MAX - 49).unwrap();
        let event = k.on_release(50).unwrap();
        // 100 ms elapsed across the wrap
        assert_eq!(event.arg2, 10);
    }

    #[test]
    fn test_momentary_reports_press() {
        let mut k = KeyState::new(4, KeyKind::Momentary, Rgb::OFF);
        let down = k.on_press(0).unwrap().unwrap();
        assert_eq!((down.code, down.arg1), (0x02, 4));
        assert_eq!(k.on_release(10).unwrap().code, 0x01);
    }

    #[test]
    fn test_clipboard_tap_requests_clip() {
        let mut k = KeyState::new(6, KeyKind::Clipboard, Rgb::OFF);
        assert_eq!(k.on_press(0), Ok(None));
        let event = k.on_release(120).unwrap();
        assert_eq!((event.code, event.arg1, event.arg2), (0x00, 6, 0x03));
        assert!(!k.is_primed());
    }

    #[test]
    fn test_clipboard_hold_primes_then_tap_cancels() {
        let mut k = KeyState::new(2, KeyKind::Clipboard, Rgb::OFF);
        k.on_press(1_000).unwrap();
        let prime = k.on_release(1_000 + CLIPBOARD_HOLD_MS).unwrap();
        assert_eq!(prime.arg2, ClipboardCommand::Prime as u8);
        assert!(k.is_primed());

        k.on_press(3_000).unwrap();
        let cancel = k.on_release(3_050).unwrap();
        assert_eq!(cancel.arg2, ClipboardCommand::CancelPrime as u8);
        assert!(!k.is_primed());

        k.on_press(4_000).unwrap();
        assert_eq!(k.on_release(4_050).unwrap().arg2, ClipboardCommand::RequestClip as u8);
    }

    #[test]
    fn test_tick_tracks_hold() {
        let mut k = key(2);
        k.tick(100);
        assert_eq!(k.hold_duration(), 0);
        k.on_press(100).unwrap();
        k.tick(350);
        assert_eq!(k.hold_duration(), 250);
    }

    #[test]
    fn test_display_color_highlights_while_pressed() {
        let mut k = KeyState::new(0, KeyKind::Macro, Rgb::new(1, 2, 3));
        assert_eq!(k.display_color(Rgb::WHITE), Rgb::new(1, 2, 3));
        k.on_press(0).unwrap();
        assert_eq!(k.display_color(Rgb::WHITE), Rgb::WHITE);
    }

    #[test]
    fn test_resync() {
        let mut k = key(9);
        k.resync(true, 40);
        assert!(k.is_pressed());
        assert_eq!(k.on_release(140).unwrap().arg2, 10);

        // A stale press is restarted, not measured from its old start
        k.on_press(0).unwrap();
        k.resync(true, 1_000);
        assert_eq!(k.on_release(1_250).unwrap().arg2, 25);
    }
}
