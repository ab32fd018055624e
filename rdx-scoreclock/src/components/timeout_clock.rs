//! The 60 second timeout clock.
//!
//! A timeout borrows the shot clock digits for its countdown. Starting one
//! halts a running shot clock and remembers its value; ending one, early or
//! at zero, puts that value back on the display. The shot clock does not
//! resume by itself.

use super::{Preemptible, Tick};
use crate::common::{BuzzerKind, ClockKind};
use crate::device::DeviceSink;
use crate::events::{ClockEvent, EventBus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, trace};

#[derive(Debug)]
struct TimeoutClockState {
    running: bool,
    timeout_value: i32,
    saved_shot_clock: i32,
}

/// Counts a timeout down once per tick.
pub struct TimeoutClock {
    state: Mutex<TimeoutClockState>,
    shot_clock: Arc<dyn Preemptible>,
    sink: Arc<dyn DeviceSink>,
    events: EventBus,
    phase: Arc<Notify>,
    timeout_seconds: i32,
    warning_seconds: i32,
    buzz_pulse: Duration,
}

impl TimeoutClock {
    pub fn new(
        shot_clock: Arc<dyn Preemptible>,
        sink: Arc<dyn DeviceSink>,
        events: EventBus,
        timeout_seconds: i32,
        warning_seconds: i32,
        buzz_pulse: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(TimeoutClockState {
                running: false,
                timeout_value: 0,
                saved_shot_clock: 0,
            }),
            shot_clock,
            sink,
            events,
            phase: Arc::new(Notify::new()),
            timeout_seconds,
            warning_seconds,
            buzz_pulse,
        }
    }

    /// Starts a timeout, preempting a running shot clock.
    ///
    /// Fires the phase signal, so a ticker registered with it delivers the
    /// first decrement one full period later. Does nothing if a timeout is
    /// already running.
    pub fn start(&self) {
        let mut state = self.lock();
        if state.running {
            return;
        }
        if self.shot_clock.is_running() {
            self.shot_clock.stop();
        }
        state.saved_shot_clock = self.shot_clock.value();
        state.timeout_value = self.timeout_seconds;
        state.running = true;
        self.phase.notify_one();
        info!(
            "Timeout started, shot clock suspended at {}s",
            state.saved_shot_clock
        );
        self.events.publish(ClockEvent::TimeoutStarted {
            saved_shot_clock: state.saved_shot_clock,
        });
    }

    /// Ends the timeout and restores the saved shot clock value on the display.
    ///
    /// Does nothing if no timeout is running.
    pub fn stop(&self) {
        let mut state = self.lock();
        self.stop_locked(&mut state);
    }

    /// The signal fired on every start. Register the ticker with it.
    pub fn phase(&self) -> Arc<Notify> {
        self.phase.clone()
    }

    pub fn timeout_value(&self) -> i32 {
        self.lock().timeout_value
    }

    /// The shot clock value captured when the current (or last) timeout started.
    pub fn saved_shot_clock(&self) -> i32 {
        self.lock().saved_shot_clock
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    fn stop_locked(&self, state: &mut TimeoutClockState) -> bool {
        if !state.running {
            return false;
        }
        state.running = false;
        self.sink.set_twenty_four(state.saved_shot_clock);
        info!(
            "Timeout ended at {}s, shot clock display restored to {}s",
            state.timeout_value, state.saved_shot_clock
        );
        self.events.publish(ClockEvent::TimeoutEnded {
            restored_shot_clock: state.saved_shot_clock,
        });
        true
    }

    fn attention(&self) {
        self.sink.set_buzz(BuzzerKind::Attention, self.buzz_pulse);
        self.events.publish(ClockEvent::Buzzer {
            kind: BuzzerKind::Attention,
        });
    }

    fn lock(&self) -> MutexGuard<'_, TimeoutClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tick for TimeoutClock {
    fn tick(&self) {
        let mut state = self.lock();
        if !state.running {
            return;
        }

        state.timeout_value -= 1;
        trace!("Timeout -> {}s", state.timeout_value);
        self.sink.set_twenty_four(state.timeout_value);
        self.events.publish(ClockEvent::Updated {
            clock: ClockKind::Timeout,
            seconds: state.timeout_value,
        });

        if state.timeout_value == self.warning_seconds {
            self.attention();
        }

        if state.timeout_value <= 0 {
            self.stop_locked(&mut state);
            self.attention();
        }
    }
}
