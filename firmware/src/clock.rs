use embassy_time::Instant;
use macropad_core::Clock;

/// Milliseconds since boot from the embassy time driver.
#[derive(Default, Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        // Truncation gives the wrapping clock the key timing expects
        Instant::now().as_millis() as u32
    }
}
