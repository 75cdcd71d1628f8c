//! Runtime controller settings.

use crate::color::Rgb;
use crate::key::{KeyKind, KEY_COUNT};

/// Settings passed to [`Controller::new`](crate::Controller::new).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Consecutive samples a key must hold a new level before it counts.
    pub debounce_ticks: u8,
    /// LED colour of a key while it is held.
    pub highlight: Rgb,
    /// Colour every key starts with. `None` uses the colour wheel spread
    /// across the keys.
    pub boot_color: Option<Rgb>,
    pub key_kinds: [KeyKind; KEY_COUNT],
    /// Send device events inside the `[ARD::0x…]` debug envelope.
    pub debug_framing: bool,
    /// Header row shown until the host writes the display.
    pub banner: &'static str,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce_ticks: 3,
            highlight: Rgb::WHITE,
            boot_color: None,
            key_kinds: [KeyKind::Macro; KEY_COUNT],
            debug_framing: false,
            banner: "MacroPad",
        }
    }
}

impl ControllerConfig {
    /// Initial colour of key `index`.
    #[must_use]
    pub fn initial_color(&self, index: usize) -> Rgb {
        match self.boot_color {
            Some(color) => color,
            None => Rgb::wheel((index * 256 / KEY_COUNT) as u8),
        }
    }
}
