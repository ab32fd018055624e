//! Contains the three scoreboard clocks and the pieces they share.
//!
//! Each clock is a long-lived object whose state sits behind its own mutex.
//! `start`, `stop` and the periodic `tick` all take that mutex, so a start
//! racing a tick can never leave the running flag and the displayed value
//! out of step. Guard conditions are no-ops, never errors: callers that care
//! whether a request took effect re-check `is_running()`.

pub mod game_clock;
pub mod shot_clock;
pub mod sub_tick;
pub mod timeout_clock;

pub use game_clock::GameClock;
pub use shot_clock::ShotClock;
pub use sub_tick::SubTickCounter;
pub use timeout_clock::TimeoutClock;

/// Something driven by a periodic ticker.
///
/// Ticks of one target are never run concurrently; the scheduler owns one
/// task per registration.
pub trait Tick: Send + Sync + 'static {
    fn tick(&self);
}

/// A clock that can be halted by another clock.
pub trait Stoppable {
    fn is_running(&self) -> bool;
    fn stop(&self);
}

/// A clock whose current value can be read by another clock.
pub trait ValueReadable {
    fn value(&self) -> i32;
}

/// The narrow view the timeout clock has of the shot clock.
pub trait Preemptible: Stoppable + ValueReadable + Send + Sync {}

impl<T: Stoppable + ValueReadable + Send + Sync> Preemptible for T {}
