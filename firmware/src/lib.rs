//! USB serial macropad firmware for RP2040.
//!
//! Board drivers for the [`macropad_core`] collaborator traits, plus the
//! USB CDC-ACM transport the controller talks to the host over.

#![no_std]

// Re-export core types for convenience
pub use macropad_core::{Controller, ControllerConfig, Hardware, KeyKind, Rgb, KEY_COUNT};

pub mod clock;
pub mod display;
pub mod encoder;
pub mod keys;
pub mod leds;
pub mod usb_serial;

pub use clock::EmbassyClock;
pub use display::LogDisplay;
pub use encoder::SharedEncoder;
pub use keys::GpioKeys;
pub use leds::{LedSignal, SignalLeds};
pub use usb_serial::{configure_usb_serial, PipeTransport, SerialPipe};
