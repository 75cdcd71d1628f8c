//! Rotary encoder with push switch.
//!
//! A PIO state machine decodes the quadrature signal; the encoder task
//! accumulates detents into an atomic that the controller polls.

use embassy_rp::gpio::Input;
use embassy_rp::pio::Instance;
use embassy_rp::pio_programs::rotary_encoder::{Direction, PioEncoder};
use macropad_core::RotaryEncoder;
use portable_atomic::{AtomicI32, Ordering};

pub struct SharedEncoder {
    position: &'static AtomicI32,
    switch: Input<'static>,
}

impl SharedEncoder {
    /// `switch` must be configured with a pull-up; it reads pressed when low.
    pub fn new(position: &'static AtomicI32, switch: Input<'static>) -> Self {
        Self { position, switch }
    }
}

impl RotaryEncoder for SharedEncoder {
    fn position(&mut self) -> i32 {
        self.position.load(Ordering::Relaxed)
    }

    fn switch_pressed(&mut self) -> bool {
        self.switch.is_low()
    }
}

/// Accumulate detents from the PIO decoder. Clockwise counts up.
pub async fn run<'d, P: Instance, const S: usize>(
    encoder: &mut PioEncoder<'d, P, S>,
    position: &AtomicI32,
) -> ! {
    loop {
        let step = match encoder.read().await {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        };
        position.fetch_add(step, Ordering::Relaxed);
    }
}
