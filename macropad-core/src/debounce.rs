//! Per-key debounce filter.
//!
//! Each key has a counter that must reach the threshold of consecutive
//! readings that disagree with the debounced state before that state flips.

/// A debounced state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Pressed,
    Released,
}

pub struct Debouncer<const N: usize> {
    /// Debounced key states: true = pressed.
    state: [bool; N],
    /// Consecutive raw readings that differ from the debounced state.
    counters: [u8; N],
    threshold: u8,
}

impl<const N: usize> Debouncer<N> {
    /// `threshold` consecutive samples are needed to register a change
    /// (0 is treated as 1).
    #[must_use]
    pub const fn new(threshold: u8) -> Self {
        Self {
            state: [false; N],
            counters: [0; N],
            threshold: if threshold == 0 { 1 } else { threshold },
        }
    }

    /// Feed one raw sample (true = pressed) and return the edges it caused.
    pub fn update(&mut self, raw: &[bool; N]) -> [Option<Edge>; N] {
        let mut edges = [None; N];

        for (i, &pressed) in raw.iter().enumerate() {
            if pressed == self.state[i] {
                self.counters[i] = 0;
                continue;
            }

            self.counters[i] = self.counters[i].saturating_add(1);
            if self.counters[i] >= self.threshold {
                self.state[i] = pressed;
                self.counters[i] = 0;
                edges[i] = Some(if pressed { Edge::Pressed } else { Edge::Released });
            }
        }

        edges
    }

    /// Current debounced states.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &[bool; N] {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_needs_threshold_samples() {
        let mut d = Debouncer::<2>::new(3);
        assert_eq!(d.update(&[true, false]), [None, None]);
        assert_eq!(d.update(&[true, false]), [None, None]);
        assert_eq!(d.update(&[true, false]), [Some(Edge::Pressed), None]);
        assert_eq!(d.state(), &[true, false]);
    }

    #[test]
    fn test_bounce_resets_counter() {
        let mut d = Debouncer::<1>::new(2);
        d.update(&[true]);
        d.update(&[false]);
        assert_eq!(d.update(&[true]), [None]);
        assert_eq!(d.update(&[true]), [Some(Edge::Pressed)]);
        assert_eq!(d.update(&[false]), [None]);
        assert_eq!(d.update(&[false]), [Some(Edge::Released)]);
    }

    #[test]
    fn test_zero_threshold_is_immediate() {
        let mut d = Debouncer::<1>::new(0);
        assert_eq!(d.update(&[true]), [Some(Edge::Pressed)]);
    }
}
