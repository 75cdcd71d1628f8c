//! Controller: ties keys, encoder, LEDs and display to the host link.

use core::fmt;

use macropad_proto::{
    FrameReader, Instruction, Opcode, ProtocolError, SendError, DEBUG_TEMPLATE,
};

use crate::color::Rgb;
use crate::config::ControllerConfig;
use crate::debounce::{Debouncer, Edge};
use crate::display::{DisplayConfiguration, MenuConfiguration, OutOfRange, MAX_DISPLAY_ROWS, MAX_MENU_ROWS};
use crate::hardware::{Clock, Hardware, KeyMatrix, LedStrip, RotaryEncoder, TextDisplay, Transport};
use crate::key::{KeyState, KEY_COUNT};

/// Reads per [`Controller::consume_serial`] call, so a chatty host cannot
/// starve the key scan.
const MAX_READS_PER_CALL: usize = 4;

/// Bytes pulled from the transport per read.
const READ_CHUNK: usize = 64;

/// Why an instruction from the host was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// Key, row or menu index outside the valid range.
    OutOfRange,
    /// Unknown opcode, or one that only travels device → host.
    UnsupportedInstruction(u8),
    /// The frame or its payload could not be parsed.
    Malformed(ProtocolError),
}

impl From<OutOfRange> for DispatchError {
    fn from(_: OutOfRange) -> Self {
        Self::OutOfRange
    }
}

impl From<ProtocolError> for DispatchError {
    fn from(e: ProtocolError) -> Self {
        Self::Malformed(e)
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "index out of range"),
            Self::UnsupportedInstruction(code) => write!(f, "unsupported instruction 0x{:02x}", code),
            Self::Malformed(e) => write!(f, "malformed instruction: {}", e),
        }
    }
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerStats {
    /// Host frames applied.
    pub frames_dispatched: u32,
    /// Host frames dropped (decode or dispatch failure).
    pub frames_rejected: u32,
    /// Device events written to the transport.
    pub events_sent: u32,
    /// Device events lost to a transport or encoding error.
    pub send_errors: u32,
}

/// The macropad's single control loop.
///
/// Call [`consume_serial`](Self::consume_serial) then
/// [`refresh`](Self::refresh) once per tick. Neither blocks.
pub struct Controller<K, L, D, E, C, T> {
    hw: Hardware<K, L, D, E, C>,
    transport: T,
    config: ControllerConfig,
    keys: [KeyState; KEY_COUNT],
    debouncer: Debouncer<KEY_COUNT>,
    display: DisplayConfiguration,
    menu: MenuConfiguration,
    menu_visible: bool,
    display_dirty: bool,
    frames: FrameReader,
    encoder_position: i32,
    switch_was_pressed: bool,
    iteration: u32,
    stats: ControllerStats,
}

impl<K, L, D, E, C, T> Controller<K, L, D, E, C, T>
where
    K: KeyMatrix,
    L: LedStrip,
    D: TextDisplay,
    E: RotaryEncoder,
    C: Clock,
    T: Transport,
{
    pub fn new(mut hw: Hardware<K, L, D, E, C>, transport: T, config: ControllerConfig) -> Self {
        let keys = core::array::from_fn(|i| {
            KeyState::new(i as u8, config.key_kinds[i], config.initial_color(i))
        });
        let encoder_position = hw.encoder.position();
        let switch_was_pressed = hw.encoder.switch_pressed();

        Self {
            hw,
            transport,
            keys,
            debouncer: Debouncer::new(config.debounce_ticks),
            display: DisplayConfiguration::with_header(config.banner),
            menu: MenuConfiguration::new(),
            menu_visible: false,
            display_dirty: true,
            frames: FrameReader::new(),
            encoder_position,
            switch_was_pressed,
            iteration: 0,
            stats: ControllerStats::default(),
            config,
        }
    }

    /// Apply one host instruction.
    ///
    /// Only state is touched here; LEDs and display catch up on the next
    /// [`refresh`](Self::refresh).
    pub fn handle_instruction(&mut self, instruction: &Instruction) -> Result<(), DispatchError> {
        let opcode = instruction
            .opcode()
            .map_err(DispatchError::UnsupportedInstruction)?;
        let row = usize::from(instruction.arg1);

        match opcode {
            Opcode::KeyColor => {
                let key = self.keys.get_mut(row).ok_or(DispatchError::OutOfRange)?;
                key.color = if instruction.extra.is_empty() {
                    Rgb::wheel(instruction.arg2)
                } else {
                    Rgb::parse_hex(&instruction.extra)?
                };
                trace!("key {} colour {:x}", row, key.color.packed());
            }
            Opcode::DisplayText => {
                if row >= MAX_DISPLAY_ROWS {
                    return Err(DispatchError::OutOfRange);
                }
                if instruction.arg3 != 0 {
                    self.display.clear();
                }
                self.display
                    .set_line(row, &instruction.extra, instruction.arg2 != 0)?;
                self.display_dirty = true;
            }
            Opcode::MenuSetRow => {
                if row >= MAX_MENU_ROWS {
                    return Err(DispatchError::OutOfRange);
                }
                if instruction.arg2 != 0 {
                    self.menu.clear();
                }
                self.menu.set_row(row, &instruction.extra)?;
                self.display_dirty = true;
            }
            Opcode::MenuShow => {
                self.menu_visible = instruction.arg1 != 0;
                self.display_dirty = true;
                debug!("menu {}", if self.menu_visible { "shown" } else { "hidden" });
            }
            Opcode::MenuNavigate => {
                if instruction.arg2 == 0 {
                    self.menu.navigate(i32::from(instruction.arg1 as i8));
                } else {
                    self.menu.select(row);
                }
                self.display_dirty = true;
            }
            Opcode::Clipboard | Opcode::KeyEvent | Opcode::KeyDown | Opcode::MenuSelect => {
                return Err(DispatchError::UnsupportedInstruction(instruction.code));
            }
        }

        Ok(())
    }

    /// Read whatever the host has sent and dispatch every complete frame.
    ///
    /// Bad frames are logged and dropped. Returns the number of frames
    /// applied.
    pub fn consume_serial(&mut self) -> usize {
        let mut dispatched = 0;
        let mut chunk = [0u8; READ_CHUNK];

        for _ in 0..MAX_READS_PER_CALL {
            match self.transport.read_ready() {
                Ok(true) => {}
                Ok(false) => break,
                Err(_) => {
                    warn!("transport not readable");
                    break;
                }
            }

            let len = match self.transport.read(&mut chunk) {
                Ok(0) => break,
                Ok(len) => len,
                Err(_) => {
                    warn!("transport read failed");
                    break;
                }
            };

            for &byte in &chunk[..len] {
                let decoded = match self.frames.push(byte) {
                    None => continue,
                    Some(frame) => Instruction::decode(frame).map_err(DispatchError::from),
                };
                if self.frames.truncated() {
                    debug!("long frame truncated");
                }

                match decoded.and_then(|ins| self.handle_instruction(&ins)) {
                    Ok(()) => {
                        dispatched += 1;
                        self.stats.frames_dispatched += 1;
                    }
                    Err(e) => {
                        warn!("instruction rejected: {}", e);
                        self.stats.frames_rejected += 1;
                    }
                }
            }
        }

        dispatched
    }

    /// One tick of the control loop: scan inputs, report events, update
    /// LEDs and display.
    pub fn refresh(&mut self) {
        let now = self.hw.clock.now_ms();

        let raw = self.hw.keys.sample();
        let edges = self.debouncer.update(&raw);
        for (index, edge) in edges.into_iter().enumerate() {
            match edge {
                Some(Edge::Pressed) => self.press(index, now),
                Some(Edge::Released) => self.release(index, now),
                None => self.keys[index].tick(now),
            }
        }

        self.poll_encoder();

        self.iteration = self.iteration.wrapping_add(1);

        let highlight = self.config.highlight;
        let colors: [Rgb; KEY_COUNT] =
            core::array::from_fn(|i| self.keys[i].display_color(highlight));
        self.hw.leds.write(&colors);

        if self.display_dirty {
            if self.menu_visible {
                let window = self.menu.visible_rows();
                self.hw.display.draw(window.rows());
            } else {
                self.hw.display.draw(self.display.rows());
            }
            self.display_dirty = false;
        }
    }

    fn press(&mut self, index: usize, now: u32) {
        match self.keys[index].on_press(now) {
            Ok(Some(event)) => self.emit(&event),
            Ok(None) => {}
            Err(e) => {
                warn!("{}", e);
                self.keys[index].resync(true, now);
            }
        }
    }

    fn release(&mut self, index: usize, now: u32) {
        match self.keys[index].on_release(now) {
            Ok(event) => self.emit(&event),
            Err(e) => {
                warn!("{}", e);
                self.keys[index].resync(false, now);
            }
        }
    }

    fn poll_encoder(&mut self) {
        let position = self.hw.encoder.position();
        let delta = position.wrapping_sub(self.encoder_position);
        self.encoder_position = position;

        if delta != 0 && self.menu_visible && !self.menu.is_empty() {
            self.menu.navigate(delta);
            self.display_dirty = true;
        }

        let switch = self.hw.encoder.switch_pressed();
        if switch && !self.switch_was_pressed && self.menu_visible && !self.menu.is_empty() {
            let row = self.menu.selected_row() as u8;
            self.emit(&Instruction::from((Opcode::MenuSelect as u8, row)));
        }
        self.switch_was_pressed = switch;
    }

    fn emit(&mut self, event: &Instruction) {
        let result = if self.config.debug_framing {
            event.sendf(DEBUG_TEMPLATE, &mut self.transport)
        } else {
            event.send(&mut self.transport)
        };

        match result {
            Ok(()) => self.stats.events_sent += 1,
            Err(SendError::Encode(e)) => {
                error!("cannot encode event: {}", e);
                self.stats.send_errors += 1;
            }
            Err(SendError::Write(_)) => {
                warn!("event dropped: {}", event);
                self.stats.send_errors += 1;
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[KeyState; KEY_COUNT] {
        &self.keys
    }

    #[inline]
    #[must_use]
    pub fn display(&self) -> &DisplayConfiguration {
        &self.display
    }

    #[inline]
    #[must_use]
    pub fn menu(&self) -> &MenuConfiguration {
        &self.menu
    }

    #[inline]
    #[must_use]
    pub fn menu_visible(&self) -> bool {
        self.menu_visible
    }

    /// Number of completed [`refresh`](Self::refresh) calls (wrapping).
    #[inline]
    #[must_use]
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware<K, L, D, E, C> {
        &mut self.hw
    }

    /// Decompose the controller into its peripherals and transport.
    pub fn into_parts(self) -> (Hardware<K, L, D, E, C>, T) {
        (self.hw, self.transport)
    }
}
