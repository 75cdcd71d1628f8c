//! Collaborator traits for the pad's peripherals.
//!
//! The controller is generic over these so it can run against the real
//! board drivers or against host-side fakes in tests. All methods are
//! synchronous and must not block: drivers that need async I/O do it in
//! their own task and hand the controller the latest value.

use crate::color::Rgb;
use crate::display::MenuRow;
use crate::key::KEY_COUNT;

/// Raw key readings.
pub trait KeyMatrix {
    /// Sample every key once; `true` = pressed, not debounced.
    fn sample(&mut self) -> [bool; KEY_COUNT];
}

/// Per-key RGB LEDs.
pub trait LedStrip {
    /// Show `colors`, one per key in key-index order.
    fn write(&mut self, colors: &[Rgb; KEY_COUNT]);
}

/// Character display.
pub trait TextDisplay {
    /// Replace the screen contents with `rows`, top to bottom.
    fn draw(&mut self, rows: &[MenuRow]);
}

/// Quadrature encoder with push switch.
pub trait RotaryEncoder {
    /// Accumulated detent count; wraps like an `i32`.
    fn position(&mut self) -> i32;

    /// Current (raw) switch level.
    fn switch_pressed(&mut self) -> bool;
}

/// Monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since boot; wraps after ~49.7 days.
    fn now_ms(&self) -> u32;
}

/// Host link: any non-blocking byte stream.
pub trait Transport: embedded_io::Read + embedded_io::ReadReady + embedded_io::Write {}

impl<T> Transport for T where T: embedded_io::Read + embedded_io::ReadReady + embedded_io::Write {}

/// The set of peripherals a [`Controller`](crate::Controller) drives.
pub struct Hardware<K, L, D, E, C> {
    pub keys: K,
    pub leds: L,
    pub display: D,
    pub encoder: E,
    pub clock: C,
}
