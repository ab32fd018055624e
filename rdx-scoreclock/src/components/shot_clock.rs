//! The 24 second shot clock.

use super::{Stoppable, SubTickCounter, Tick, ValueReadable};
use crate::common::{BuzzerKind, ClockKind};
use crate::device::DeviceSink;
use crate::events::{ClockEvent, EventBus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace};

#[derive(Debug)]
struct ShotClockState {
    running: bool,
    seconds: i32,
    sub_tick: SubTickCounter,
}

/// Counts the shot clock down, buzzing and resetting when it runs out.
///
/// A tick decrements before it displays, so a clock started at the full value
/// would never show that value. Starting from the full value (or forcing the
/// short value) therefore stores one second more than is displayed.
pub struct ShotClock {
    state: Mutex<ShotClockState>,
    sink: Arc<dyn DeviceSink>,
    events: EventBus,
    full_seconds: i32,
    fourteen_seconds: i32,
}

impl ShotClock {
    pub fn new(
        sink: Arc<dyn DeviceSink>,
        events: EventBus,
        ticks_per_second: u32,
        full_seconds: i32,
        fourteen_seconds: i32,
    ) -> Self {
        Self {
            state: Mutex::new(ShotClockState {
                running: false,
                seconds: full_seconds,
                sub_tick: SubTickCounter::new(ticks_per_second),
            }),
            sink,
            events,
            full_seconds,
            fourteen_seconds,
        }
    }

    /// Starts counting down. Does nothing if running or at zero.
    pub fn start(&self) {
        let mut state = self.lock();
        self.start_locked(&mut state);
    }

    /// Stops counting. Does nothing if not running.
    pub fn stop(&self) {
        let mut state = self.lock();
        self.stop_locked(&mut state);
    }

    /// Puts the clock back to the full value, keeping it running if it was.
    pub fn reset(&self) {
        self.set_value(self.full_seconds);
    }

    /// Forces the short value, keeping the clock running if it was.
    pub fn set_fourteen(&self) {
        let mut state = self.lock();
        let was_running = self.stop_locked(&mut state);
        state.seconds = self.fourteen_seconds + 1;
        self.sink.set_twenty_four(self.fourteen_seconds);
        debug!("Shot clock forced to {}s", self.fourteen_seconds);
        self.events.publish(ClockEvent::Updated {
            clock: ClockKind::Shot,
            seconds: self.fourteen_seconds,
        });
        if was_running {
            self.start_locked(&mut state);
        }
    }

    /// Overwrites the value, keeping the clock running if it was.
    ///
    /// The value is clamped to `[0, full + 1]`.
    pub fn set_value(&self, seconds: i32) {
        let seconds = seconds.clamp(0, self.full_seconds + 1);
        let mut state = self.lock();
        let was_running = self.stop_locked(&mut state);
        state.seconds = seconds;
        self.sink.set_twenty_four(seconds);
        debug!("Shot clock set to {}s", seconds);
        self.events.publish(ClockEvent::Updated {
            clock: ClockKind::Shot,
            seconds,
        });
        if was_running {
            self.start_locked(&mut state);
        }
    }

    /// Blanks or unblanks the digits. Value and running state are untouched.
    pub fn set_visible(&self, visible: bool) {
        self.sink.show_twenty_four_seconds(visible);
    }

    /// Flips the digits between blanked and visible.
    pub fn toggle_visible(&self) {
        self.sink.switch_twenty_four_seconds();
    }

    pub fn value(&self) -> i32 {
        self.lock().seconds
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn full_seconds(&self) -> i32 {
        self.full_seconds
    }

    fn start_locked(&self, state: &mut ShotClockState) -> bool {
        if state.running || state.seconds <= 0 {
            return false;
        }
        if state.seconds == self.full_seconds {
            state.seconds = self.full_seconds + 1;
        }
        state.sub_tick.arm();
        state.running = true;
        info!("Shot clock started at {}s", state.seconds);
        self.events.publish(ClockEvent::Started {
            clock: ClockKind::Shot,
            seconds: state.seconds,
        });
        true
    }

    fn stop_locked(&self, state: &mut ShotClockState) -> bool {
        if !state.running {
            return false;
        }
        state.running = false;
        info!("Shot clock stopped at {}s", state.seconds);
        self.events.publish(ClockEvent::Stopped {
            clock: ClockKind::Shot,
            seconds: state.seconds,
        });
        true
    }

    fn lock(&self) -> MutexGuard<'_, ShotClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tick for ShotClock {
    fn tick(&self) {
        let mut state = self.lock();
        if !state.running || !state.sub_tick.advance() {
            return;
        }

        state.seconds -= 1;
        trace!("Shot clock -> {}s", state.seconds);
        self.sink.set_twenty_four(state.seconds);
        self.events.publish(ClockEvent::Updated {
            clock: ClockKind::Shot,
            seconds: state.seconds,
        });

        if state.seconds <= 0 {
            self.stop_locked(&mut state);
            info!("Shot clock expired");
            self.sink.buzz(BuzzerKind::EndTwentyFour);
            state.seconds = self.full_seconds;
            self.events.publish(ClockEvent::ShotClockExpired);
            self.events.publish(ClockEvent::Buzzer {
                kind: BuzzerKind::EndTwentyFour,
            });
        }
    }
}

impl Stoppable for ShotClock {
    fn is_running(&self) -> bool {
        ShotClock::is_running(self)
    }

    fn stop(&self) {
        ShotClock::stop(self)
    }
}

impl ValueReadable for ShotClock {
    fn value(&self) -> i32 {
        ShotClock::value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCommand, RecordingSink};

    fn shot_clock(sink: Arc<RecordingSink>) -> ShotClock {
        ShotClock::new(sink, EventBus::default(), 1, 24, 14)
    }

    #[test]
    fn start_from_full_value_bumps_by_one() {
        let sink = Arc::new(RecordingSink::new());
        let clock = shot_clock(sink.clone());
        clock.start();
        assert_eq!(clock.value(), 25);
        clock.tick();
        assert_eq!(sink.last_twenty_four(), Some(24));
    }

    #[test]
    fn start_at_zero_is_ignored() {
        let sink = Arc::new(RecordingSink::new());
        let clock = shot_clock(sink);
        clock.set_value(0);
        clock.start();
        assert!(!clock.is_running());
    }

    #[test]
    fn set_value_keeps_running_clock_running() {
        let sink = Arc::new(RecordingSink::new());
        let clock = shot_clock(sink.clone());
        clock.set_value(12);
        clock.start();
        assert_eq!(clock.value(), 12);
        clock.reset();
        assert!(clock.is_running());
        assert_eq!(clock.value(), 25);
        assert_eq!(sink.last_twenty_four(), Some(24));
    }

    #[test]
    fn set_value_clamps_out_of_range() {
        let sink = Arc::new(RecordingSink::new());
        let clock = shot_clock(sink);
        clock.set_value(-3);
        assert_eq!(clock.value(), 0);
        clock.set_value(99);
        assert_eq!(clock.value(), 25);
    }

    #[test]
    fn fourteen_displays_fourteen_and_stores_fifteen() {
        let sink = Arc::new(RecordingSink::new());
        let clock = shot_clock(sink.clone());
        clock.set_fourteen();
        assert!(!clock.is_running());
        assert_eq!(clock.value(), 15);
        assert_eq!(sink.last_twenty_four(), Some(14));

        clock.start();
        clock.tick();
        assert_eq!(sink.last_twenty_four(), Some(14));
    }

    #[test]
    fn fourteen_restarts_a_running_clock() {
        let sink = Arc::new(RecordingSink::new());
        let clock = shot_clock(sink);
        clock.start();
        clock.tick();
        clock.set_fourteen();
        assert!(clock.is_running());
        assert_eq!(clock.value(), 15);
    }

    #[test]
    fn visibility_does_not_touch_state() {
        let sink = Arc::new(RecordingSink::new());
        let clock = shot_clock(sink.clone());
        clock.set_visible(false);
        clock.toggle_visible();
        assert_eq!(
            sink.commands(),
            vec![
                DeviceCommand::ShowTwentyFour(false),
                DeviceCommand::SwitchTwentyFour
            ]
        );
        assert_eq!(clock.value(), 24);
        assert!(!clock.is_running());
    }

    #[test]
    fn expiry_buzzes_once_and_resets_stopped() {
        let sink = Arc::new(RecordingSink::new());
        let clock = shot_clock(sink.clone());
        clock.set_value(2);
        clock.start();
        for _ in 0..5 {
            clock.tick();
        }
        assert!(!clock.is_running());
        assert_eq!(clock.value(), 24);
        assert_eq!(sink.buzzes(), vec![BuzzerKind::EndTwentyFour]);
        assert_eq!(sink.last_twenty_four(), Some(0));
    }
}
