//! Serial instruction protocol for the macropad firmware.
//!
//! This crate provides everything needed to speak the device/host protocol:
//!
//! - **Hex codec**: [`hex::decode_hex`], [`hex::encode_hex`], [`hex::hex_digit_value`]
//! - **Messages**: [`Instruction`] with decode, encode, [`Instruction::send`]
//!   and [`Instruction::sendf`]
//! - **Opcodes**: [`Opcode`] and the per-opcode [`HeaderWidth`]
//! - **Framing**: [`FrameReader`] accumulates the inbound byte stream
//!
//! # Protocol Format
//!
//! ```text
//! <code><arg1>[<arg2>[<arg3>]]<extra>\n
//! ```
//!
//! - each field is 2 lowercase hex digits (uppercase accepted on input)
//! - header width (4, 6 or 8 digits) is fixed by the opcode
//! - `extra` is free text, taken verbatim
//! - `\n` terminates the frame (`\r\n` accepted on input)
//!
//! Key 5 released after about 1.1 s:
//!
//! ```text
//! 010565\n
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod error;
pub mod frame;
pub mod hex;
pub mod instruction;
pub mod opcode;

pub use error::{ProtocolError, SendError};
pub use frame::FrameReader;
pub use instruction::{
    Instruction, DEBUG_TEMPLATE, DEFAULT_INSTRUCTION_HEX_DIGITS, FRAME_DELIMITER, MAX_EXTRA_LEN,
    MAX_FRAME_LEN,
};
pub use opcode::{ClipboardCommand, HeaderWidth, Opcode};
