//! The write-only boundary between the clocks and the scoreboard hardware.
//!
//! Clocks only ever talk to a [`DeviceSink`]. Every call is fire-and-forget:
//! it must return promptly, must not report failure to the clock, and may be
//! repeated freely. The clock's own state is authoritative regardless of what
//! the hardware ends up showing.

use crate::common::BuzzerKind;
use std::time::Duration;

pub mod driver;
pub mod recording;

pub use driver::CommandSink;
pub use recording::RecordingSink;

/// Pulse length used by [`DeviceSink::buzz`] unless an implementation knows better.
pub const DEFAULT_BUZZ: Duration = Duration::from_secs(2);

/// Commands understood by the scoreboard hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Show `seconds` on the game clock digits.
    ClockOnly(i32),
    /// Show `seconds` on the shot clock digits.
    TwentyFour(i32),
    /// Pulse a buzzer for `duration`.
    Buzz { kind: BuzzerKind, duration: Duration },
    /// Blank (`false`) or unblank (`true`) the shot clock digits.
    ShowTwentyFour(bool),
    /// Flip the shot clock digits between blanked and visible.
    SwitchTwentyFour,
    /// Blank every digit on the board.
    ClearBoard,
}

/// A synchronous, non-blocking, best-effort sink for display and buzzer updates.
pub trait DeviceSink: Send + Sync {
    /// Updates the game clock display.
    fn set_clock_only(&self, seconds: i32);

    /// Updates the shot clock display. The timeout clock reuses these digits.
    fn set_twenty_four(&self, seconds: i32);

    /// Pulses a buzzer for an explicit duration.
    fn set_buzz(&self, kind: BuzzerKind, duration: Duration);

    /// Pulses a buzzer for the sink's default duration.
    fn buzz(&self, kind: BuzzerKind) {
        self.set_buzz(kind, DEFAULT_BUZZ);
    }

    /// Blanks or unblanks the shot clock without touching its value.
    fn show_twenty_four_seconds(&self, visible: bool);

    /// Toggles shot clock blanking.
    fn switch_twenty_four_seconds(&self);

    /// Blanks the whole board.
    fn clear_board(&self);
}
