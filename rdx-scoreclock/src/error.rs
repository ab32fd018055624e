//! Structured refusals returned by the `ScoreboardEngine`.
//!
//! The clocks themselves never fail: an invalid transition is a silent no-op.
//! The engine checks its cross-clock rules before touching a clock and reports
//! a refused operation as a [`Rejection`], leaving every clock untouched. Each
//! variant carries what a caller needs to explain the refusal to an operator.

use crate::common::{ClockKind, GameMode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The clock is already running.
    #[error("{0} is already running")]
    AlreadyRunning(ClockKind),

    /// The clock must be running for this operation.
    #[error("{0} is not running")]
    NotRunning(ClockKind),

    /// The clock must be stopped before it can be edited.
    #[error("{0} must be stopped first")]
    MustBeStopped(ClockKind),

    /// A timeout is in progress.
    #[error("not allowed while a timeout is running")]
    TimeoutRunning,

    /// Timeouts may only start while the game clock is stopped.
    #[error("can't start a timeout while the game clock is running")]
    GameClockRunning,

    /// A clock cannot start from zero or less.
    #[error("{clock} can't start from {seconds}s")]
    NothingToCount { clock: ClockKind, seconds: i32 },

    /// The requested value would leave the allowed range.
    #[error("{clock} can't go to {requested}s (allowed {min}..={max})")]
    OutOfRange {
        clock: ClockKind,
        requested: i32,
        min: i32,
        max: i32,
    },

    /// The kids period limit is lower than the regular one.
    #[error("can't be higher than {max}s in {mode} mode")]
    PeriodLimit { mode: GameMode, max: i32 },
}
