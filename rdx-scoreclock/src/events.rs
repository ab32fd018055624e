//! Defines all public event types broadcast by the scoreboard clocks.
//!
//! Listeners subscribe through `ScoreboardEngine::subscribe_events` and receive
//! a `ClockEvent` for every state change, independent of whether the hardware
//! update for that change succeeded.

use crate::common::{BuzzerKind, ClockKind, GameMode};
use tokio::sync::broadcast;

/// A state change of one of the clocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockEvent {
    /// A clock began ticking from `seconds`.
    Started { clock: ClockKind, seconds: i32 },
    /// A clock stopped; `seconds` is the value it kept.
    Stopped { clock: ClockKind, seconds: i32 },
    /// A clock's displayed value changed.
    Updated { clock: ClockKind, seconds: i32 },
    /// The game clock reached the end of the period.
    PeriodEnded { mode: GameMode, seconds: i32 },
    /// The shot clock ran out and was reset.
    ShotClockExpired,
    /// A timeout began, suspending the shot clock at `saved_shot_clock`.
    TimeoutStarted { saved_shot_clock: i32 },
    /// A timeout ended and the shot clock display was restored.
    TimeoutEnded { restored_shot_clock: i32 },
    /// A buzzer was sounded.
    Buzzer { kind: BuzzerKind },
}

/// Events related to the lifecycle of the engine itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemEvent {
    /// Fired once when the tickers have been registered.
    EngineStarted,
    /// Fired once when all tickers have been cancelled.
    EngineShutdown,
}

/// Cheap, cloneable handle the clocks use to publish their events.
///
/// Publishing never fails from the caller's point of view: an event sent while
/// nobody is subscribed is simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClockEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: ClockEvent) {
        self.sender.send(event).ok();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClockEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
