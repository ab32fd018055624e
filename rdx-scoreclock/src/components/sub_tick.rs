//! Decimates a fast ticker down to one update per second.

/// Value the counter is armed with on `start`, so the first update lands
/// within one fast tick instead of up to a full second later.
pub const START_VALUE: u32 = 1;

/// An update is due when the counter falls to this value.
pub const UPDATE_THRESHOLD: u32 = 0;

/// Counts fast ticks down to the next second boundary.
///
/// The counter always stays within `[UPDATE_THRESHOLD, reset]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubTickCounter {
    remaining: u32,
    reset: u32,
}

impl SubTickCounter {
    /// `ticks_per_second` is how many fast ticks make one second; values
    /// below one are treated as one.
    pub fn new(ticks_per_second: u32) -> Self {
        Self {
            remaining: START_VALUE,
            reset: ticks_per_second.max(1),
        }
    }

    /// Makes the next fast tick a second boundary.
    pub fn arm(&mut self) {
        self.remaining = START_VALUE;
    }

    /// Consumes one fast tick. Returns `true` on a second boundary, after
    /// which the counter is back at its reset value.
    pub fn advance(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining <= UPDATE_THRESHOLD {
            self.remaining = self.reset;
            true
        } else {
            false
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}
