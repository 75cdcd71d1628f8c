//! Key backlight: a WS2812 chain driven by a PIO state machine.
//!
//! The controller publishes a frame through a [`Signal`]; the LED task
//! waits on it and pushes the latest frame out, so a slow transfer never
//! holds up the control loop.

use embassy_rp::pio::Instance;
use embassy_rp::pio_programs::ws2812::PioWs2812;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use macropad_core::{LedStrip, Rgb, KEY_COUNT};
use smart_leds::RGB8;

pub type LedFrame = [RGB8; KEY_COUNT];
pub type LedSignal = Signal<CriticalSectionRawMutex, LedFrame>;

/// Scale applied to every channel; full brightness draws too much from USB.
const BRIGHTNESS: u8 = 64;

#[inline]
fn to_rgb8(color: Rgb) -> RGB8 {
    let scale = |c: u8| ((u16::from(c) * u16::from(BRIGHTNESS)) / 255) as u8;
    RGB8::new(scale(color.r), scale(color.g), scale(color.b))
}

/// [`LedStrip`] that hands frames to the LED task.
pub struct SignalLeds {
    signal: &'static LedSignal,
    last: Option<LedFrame>,
}

impl SignalLeds {
    pub const fn new(signal: &'static LedSignal) -> Self {
        Self { signal, last: None }
    }
}

impl LedStrip for SignalLeds {
    fn write(&mut self, colors: &[Rgb; KEY_COUNT]) {
        let frame = colors.map(to_rgb8);
        if self.last != Some(frame) {
            self.signal.signal(frame);
            self.last = Some(frame);
        }
    }
}

/// Push each signalled frame to the strip.
pub async fn run<'d, P: Instance, const S: usize>(
    ws2812: &mut PioWs2812<'d, P, S, KEY_COUNT>,
    signal: &LedSignal,
) -> ! {
    loop {
        let frame = signal.wait().await;
        ws2812.write(&frame).await;
    }
}
