//! Platform-agnostic macropad logic: keys, LEDs, display, menu and the
//! controller that connects them to the host.
//!
//! This crate has no hardware dependencies. The board firmware implements
//! the traits in [`hardware`]; host tests implement them with fakes.
//!
//! # Overview
//!
//! - [`key`]: per-key state machine ([`KeyState`], [`KeyKind`]) and
//!   [`quantize_duration`]
//! - [`debounce`]: counter-based key debouncing ([`Debouncer`])
//! - [`display`]: text rows and the selectable menu
//! - [`color`]: key LED colours ([`Rgb`])
//! - [`hardware`]: collaborator traits
//! - [`controller`]: the control loop ([`Controller`])
//!
//! # Example
//!
//! ```rust
//! use macropad_core::{KeyKind, KeyState, Rgb};
//!
//! let mut key = KeyState::new(5, KeyKind::Macro, Rgb::OFF);
//! key.on_press(1_000).unwrap();
//! let event = key.on_release(2_140).unwrap();
//! assert_eq!(&event.encode_frame().unwrap()[..], b"010566\n");
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt (for embedded logging)

#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod logging;

pub mod color;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod display;
pub mod hardware;
pub mod key;

pub use color::Rgb;
pub use config::ControllerConfig;
pub use controller::{Controller, ControllerStats, DispatchError};
pub use debounce::{Debouncer, Edge};
pub use display::{
    DisplayConfiguration, MenuConfiguration, MenuRow, OutOfRange, DISPLAY_COLUMNS,
    MAX_DISPLAY_ROWS, MAX_MENU_ROWS,
};
pub use hardware::{Clock, Hardware, KeyMatrix, LedStrip, RotaryEncoder, TextDisplay, Transport};
pub use key::{quantize_duration, KeyError, KeyKind, KeyState, CLIPBOARD_HOLD_MS, KEY_COUNT};

pub use macropad_proto as proto;
