//! The game clock: counts a period up (football) or down (basketball).

use super::{SubTickCounter, Tick};
use crate::common::{BuzzerKind, ClockKind, GameMode};
use crate::device::DeviceSink;
use crate::events::{ClockEvent, EventBus};
use crate::relay::Relay;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace};

#[derive(Debug)]
struct GameClockState {
    running: bool,
    seconds: i32,
    mode: GameMode,
    mirrored: bool,
    sub_tick: SubTickCounter,
}

/// Tracks the elapsed or remaining seconds of the running period.
pub struct GameClock {
    state: Mutex<GameClockState>,
    sink: Arc<dyn DeviceSink>,
    relay: Arc<dyn Relay>,
    events: EventBus,
    football_duration: i32,
}

impl GameClock {
    /// Creates a stopped clock at zero seconds.
    ///
    /// `football_duration` is the period length at which a count-up clock ends.
    pub fn new(
        sink: Arc<dyn DeviceSink>,
        relay: Arc<dyn Relay>,
        events: EventBus,
        ticks_per_second: u32,
        football_duration: i32,
    ) -> Self {
        Self {
            state: Mutex::new(GameClockState {
                running: false,
                seconds: 0,
                mode: GameMode::default(),
                mirrored: false,
                sub_tick: SubTickCounter::new(ticks_per_second),
            }),
            sink,
            relay,
            events,
            football_duration,
        }
    }

    /// Starts the clock from `initial_seconds`.
    ///
    /// Does nothing if the clock is already running or `initial_seconds <= 0`.
    pub fn start(&self, initial_seconds: i32, mode: GameMode, mirrored: bool) {
        let mut state = self.lock();
        if state.running || initial_seconds <= 0 {
            trace!(
                "Game clock start ignored (running: {}, seconds: {})",
                state.running,
                initial_seconds
            );
            return;
        }
        state.mode = mode;
        state.mirrored = mirrored;
        state.seconds = initial_seconds;
        state.running = true;
        state.sub_tick.arm();
        info!("Game clock started at {}s ({}, mirrored: {})", initial_seconds, mode, mirrored);
        self.events.publish(ClockEvent::Started {
            clock: ClockKind::Game,
            seconds: initial_seconds,
        });
    }

    /// Stops the clock, keeping its value. Does nothing if it is not running.
    pub fn stop(&self) {
        let mut state = self.lock();
        self.stop_locked(&mut state);
    }

    /// Overwrites the value and pushes it to the display right away.
    ///
    /// Used to seed a new game and for manual edits while stopped.
    pub fn set_seconds(&self, seconds: i32) {
        let mut state = self.lock();
        state.seconds = seconds;
        self.display(&state);
        debug!("Game clock set to {}s", seconds);
        self.events.publish(ClockEvent::Updated {
            clock: ClockKind::Game,
            seconds,
        });
    }

    /// Records the mode and mirroring of a newly loaded game without starting.
    pub fn configure(&self, mode: GameMode, mirrored: bool) {
        let mut state = self.lock();
        state.mode = mode;
        state.mirrored = mirrored;
    }

    pub fn seconds(&self) -> i32 {
        self.lock().seconds
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn mode(&self) -> GameMode {
        self.lock().mode
    }

    pub fn is_mirrored(&self) -> bool {
        self.lock().mirrored
    }

    fn stop_locked(&self, state: &mut GameClockState) -> bool {
        if !state.running {
            return false;
        }
        state.running = false;
        info!("Game clock stopped at {}s", state.seconds);
        self.events.publish(ClockEvent::Stopped {
            clock: ClockKind::Game,
            seconds: state.seconds,
        });
        true
    }

    fn display(&self, state: &GameClockState) {
        if state.mirrored {
            self.relay.push_game_clock(state.seconds);
        }
        self.sink.set_clock_only(state.seconds);
    }

    fn period_over(&self, state: &GameClockState) -> bool {
        if state.mode.counts_up() {
            state.seconds >= self.football_duration
        } else {
            state.seconds <= 0
        }
    }

    fn lock(&self) -> MutexGuard<'_, GameClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tick for GameClock {
    fn tick(&self) {
        let mut state = self.lock();
        if !state.running || !state.sub_tick.advance() {
            return;
        }

        state.seconds += if state.mode.counts_up() { 1 } else { -1 };
        trace!("Game clock -> {}s", state.seconds);
        self.display(&state);
        self.events.publish(ClockEvent::Updated {
            clock: ClockKind::Game,
            seconds: state.seconds,
        });

        if self.period_over(&state) {
            self.stop_locked(&mut state);
            info!("End of period ({}) at {}s", state.mode, state.seconds);
            self.sink.buzz(BuzzerKind::EndQuarter);
            self.events.publish(ClockEvent::PeriodEnded {
                mode: state.mode,
                seconds: state.seconds,
            });
            self.events.publish(ClockEvent::Buzzer {
                kind: BuzzerKind::EndQuarter,
            });
        }
    }
}
