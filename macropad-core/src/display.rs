//! Text display and menu state.
//!
//! Both are plain data mutated by host instructions or the encoder; the
//! display driver only ever sees the rows produced here.

use core::fmt;

use heapless::{String, Vec};

/// Characters per row (128 px wide panel, 6 px font).
pub const DISPLAY_COLUMNS: usize = 21;

/// Text rows on the panel (64 px tall, 8 px font).
pub const MAX_DISPLAY_ROWS: usize = 8;

/// Selectable rows in a menu.
pub const MAX_MENU_ROWS: usize = 10;

/// Replacement for bytes that are not valid UTF-8.
const REPLACEMENT: char = '?';

/// A row index outside the configuration's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRange;

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index out of range")
    }
}

/// One line of text, optionally drawn inverted (highlighted).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MenuRow {
    pub text: String<DISPLAY_COLUMNS>,
    pub inverted: bool,
}

impl MenuRow {
    /// Build a row from raw bytes, silently truncated to [`DISPLAY_COLUMNS`].
    #[must_use]
    pub fn new(text: &[u8], inverted: bool) -> Self {
        Self {
            text: truncate_text(text),
            inverted,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for MenuRow {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}{=str}", if self.inverted { ">" } else { " " }, self.text.as_str())
    }
}

/// Copy as many characters as fit, replacing invalid UTF-8 with `?`.
fn truncate_text(mut bytes: &[u8]) -> String<DISPLAY_COLUMNS> {
    let mut out = String::new();

    while !bytes.is_empty() {
        let (valid, rest, invalid) = match core::str::from_utf8(bytes) {
            Ok(s) => (s, &[][..], false),
            Err(e) => {
                let (head, after) = bytes.split_at(e.valid_up_to());
                let skip = e.error_len().unwrap_or(after.len());
                let head = core::str::from_utf8(head).unwrap_or("");
                (head, &after[skip..], true)
            }
        };

        for c in valid.chars() {
            if out.push(c).is_err() {
                return out;
            }
        }
        if invalid && out.push(REPLACEMENT).is_err() {
            return out;
        }
        bytes = rest;
    }

    out
}

/// The free-text screen: up to [`MAX_DISPLAY_ROWS`] rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayConfiguration {
    rows: Vec<MenuRow, MAX_DISPLAY_ROWS>,
}

impl DisplayConfiguration {
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// A screen with a single header row.
    #[must_use]
    pub fn with_header(header: &str) -> Self {
        let mut config = Self::new();
        // Row 0 always fits
        let _ = config.rows.push(MenuRow::new(header.as_bytes(), false));
        config
    }

    /// Replace one row, padding with blank rows if it is past the end.
    pub fn set_line(&mut self, row: usize, text: &[u8], inverted: bool) -> Result<(), OutOfRange> {
        if row >= MAX_DISPLAY_ROWS {
            return Err(OutOfRange);
        }
        while self.rows.len() <= row {
            self.rows.push(MenuRow::default()).map_err(|_| OutOfRange)?;
        }
        self.rows[row] = MenuRow::new(text, inverted);
        Ok(())
    }

    /// Replace every row at once.
    pub fn replace<'a, I>(&mut self, lines: I) -> Result<(), OutOfRange>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut rows = Vec::new();
        for line in lines {
            rows.push(MenuRow::new(line.as_bytes(), false))
                .map_err(|_| OutOfRange)?;
        }
        self.rows = rows;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[MenuRow] {
        &self.rows
    }
}

/// A selectable list of up to [`MAX_MENU_ROWS`] rows.
///
/// `selected_row < len()` whenever the menu is not empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MenuConfiguration {
    rows: Vec<MenuRow, MAX_MENU_ROWS>,
    selected_row: usize,
}

impl MenuConfiguration {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: Vec::new(),
            selected_row: 0,
        }
    }

    /// Set one entry, padding with blank entries if it is past the end.
    pub fn set_row(&mut self, row: usize, text: &[u8]) -> Result<(), OutOfRange> {
        if row >= MAX_MENU_ROWS {
            return Err(OutOfRange);
        }
        while self.rows.len() <= row {
            self.rows.push(MenuRow::default()).map_err(|_| OutOfRange)?;
        }
        self.rows[row] = MenuRow::new(text, false);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.selected_row = 0;
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn selected_row(&self) -> usize {
        self.selected_row
    }

    #[must_use]
    pub fn selected(&self) -> Option<&MenuRow> {
        self.rows.get(self.selected_row)
    }

    /// Move the selection by `delta` rows, wrapping around. No-op when empty.
    pub fn navigate(&mut self, delta: i32) {
        if self.rows.is_empty() {
            return;
        }
        let len = self.rows.len() as i64;
        let target = (self.selected_row as i64 + delta as i64).rem_euclid(len);
        self.selected_row = target as usize;
    }

    /// Select row `row` modulo the row count. No-op when empty.
    pub fn select(&mut self, row: usize) {
        if !self.rows.is_empty() {
            self.selected_row = row % self.rows.len();
        }
    }

    /// The rows to draw: a window of at most [`MAX_DISPLAY_ROWS`] entries
    /// containing the selection, which is drawn inverted.
    #[must_use]
    pub fn visible_rows(&self) -> DisplayConfiguration {
        let start = (self.selected_row + 1).saturating_sub(MAX_DISPLAY_ROWS);
        let mut window = DisplayConfiguration::new();

        for (i, row) in self.rows.iter().enumerate().skip(start).take(MAX_DISPLAY_ROWS) {
            let entry = MenuRow {
                text: row.text.clone(),
                inverted: i == self.selected_row,
            };
            // take() bounds the window to the display's capacity
            let _ = window.rows.push(entry);
        }

        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_line_pads_and_truncates() {
        let mut display = DisplayConfiguration::new();
        display
            .set_line(2, b"this line is far too long for the panel", true)
            .unwrap();

        let rows = display.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], MenuRow::default());
        assert_eq!(rows[2].as_str(), "this line is far too ");
        assert_eq!(rows[2].as_str().len(), DISPLAY_COLUMNS);
        assert!(rows[2].inverted);
    }

    #[test]
    fn test_set_line_out_of_range() {
        let mut display = DisplayConfiguration::with_header("MacroPad");
        assert_eq!(display.set_line(MAX_DISPLAY_ROWS, b"x", false), Err(OutOfRange));
        assert_eq!(display.rows().len(), 1);
        assert_eq!(display.rows()[0].as_str(), "MacroPad");
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let row = MenuRow::new(b"ab\xffcd", false);
        assert_eq!(row.as_str(), "ab?cd");
    }

    #[test]
    fn test_multibyte_truncation_stays_on_char_boundary() {
        // 20 ASCII chars then a 2-byte char needs 22 bytes, one too many
        let row = MenuRow::new("aaaaaaaaaaaaaaaaaaaaé".as_bytes(), false);
        assert_eq!(row.as_str(), "aaaaaaaaaaaaaaaaaaaa");
    }

    #[test]
    fn test_replace_wholesale() {
        let mut display = DisplayConfiguration::with_header("old");
        display.replace(["one", "two"]).unwrap();
        assert_eq!(display.rows().len(), 2);
        assert_eq!(display.rows()[1].as_str(), "two");
        assert_eq!(display.replace(["x"; 9]), Err(OutOfRange));
    }

    #[test]
    fn test_menu_navigation_wraps() {
        let mut menu = MenuConfiguration::new();
        for (i, label) in ["a", "b", "c"].iter().enumerate() {
            menu.set_row(i, label.as_bytes()).unwrap();
        }
        menu.navigate(-1);
        assert_eq!(menu.selected_row(), 2);
        menu.navigate(2);
        assert_eq!(menu.selected_row(), 1);
        menu.navigate(i32::MIN);
        assert!(menu.selected_row() < 3);
        menu.select(7);
        assert_eq!(menu.selected_row(), 1);
        assert_eq!(menu.selected().map(MenuRow::as_str), Some("b"));
    }

    #[test]
    fn test_empty_menu_navigation_is_noop() {
        let mut menu = MenuConfiguration::new();
        menu.navigate(3);
        menu.select(4);
        assert_eq!(menu.selected_row(), 0);
        assert!(menu.selected().is_none());
        assert!(menu.visible_rows().rows().is_empty());
    }

    #[test]
    fn test_visible_window_follows_selection() {
        let mut menu = MenuConfiguration::new();
        for i in 0..MAX_MENU_ROWS {
            menu.set_row(i, &[b'0' + i as u8]).unwrap();
        }
        menu.select(9);
        let window = menu.visible_rows();
        let rows = window.rows();
        assert_eq!(rows.len(), MAX_DISPLAY_ROWS);
        assert_eq!(rows[0].as_str(), "2");
        assert!(rows[7].inverted);
        assert_eq!(rows.iter().filter(|r| r.inverted).count(), 1);

        menu.select(0);
        assert_eq!(menu.visible_rows().rows()[0].as_str(), "0");
        assert!(menu.visible_rows().rows()[0].inverted);
    }

    #[test]
    fn test_menu_row_out_of_range() {
        let mut menu = MenuConfiguration::new();
        assert_eq!(menu.set_row(MAX_MENU_ROWS, b"x"), Err(OutOfRange));
        assert!(menu.is_empty());
    }
}
