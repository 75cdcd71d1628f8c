//! Text output for boards without a panel fitted: rows go to the defmt log.

use macropad_core::{MenuRow, TextDisplay};

/// [`TextDisplay`] that logs each redraw instead of driving the SH1106 panel.
#[derive(Default)]
pub struct LogDisplay;

impl TextDisplay for LogDisplay {
    fn draw(&mut self, rows: &[MenuRow]) {
        defmt::info!("display: {} rows", rows.len());
        for (i, row) in rows.iter().enumerate() {
            defmt::info!("  {}: {}", i, row);
        }
    }
}
