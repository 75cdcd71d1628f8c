//! Key switches wired straight to GPIO, one pin per key.
//!
//! Switches pull the pin to ground, so a key reads pressed when low.

use embassy_rp::gpio::{AnyPin, Input, Pull};
use embassy_rp::Peri;
use macropad_core::{KeyMatrix, KEY_COUNT};

pub struct GpioKeys {
    inputs: [Input<'static>; KEY_COUNT],
}

impl GpioKeys {
    /// Configure each pin as an input with pull-up, in key-index order.
    pub fn new(pins: [Peri<'static, AnyPin>; KEY_COUNT]) -> Self {
        Self {
            inputs: pins.map(|pin| Input::new(pin, Pull::Up)),
        }
    }
}

impl KeyMatrix for GpioKeys {
    fn sample(&mut self) -> [bool; KEY_COUNT] {
        core::array::from_fn(|i| self.inputs[i].is_low())
    }
}
