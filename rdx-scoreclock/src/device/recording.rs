//! An in-memory sink that records every command, for tests and dry runs.

use super::{DeviceCommand, DeviceSink};
use crate::common::BuzzerKind;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Records every command in the order it was sent.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Mutex<Vec<DeviceCommand>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns and forgets everything recorded so far.
    pub fn take(&self) -> Vec<DeviceCommand> {
        std::mem::take(&mut *self.commands.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// The last value sent to the shot clock digits, if any.
    pub fn last_twenty_four(&self) -> Option<i32> {
        self.commands().iter().rev().find_map(|command| match command {
            DeviceCommand::TwentyFour(seconds) => Some(*seconds),
            _ => None,
        })
    }

    /// The last value sent to the game clock digits, if any.
    pub fn last_clock(&self) -> Option<i32> {
        self.commands().iter().rev().find_map(|command| match command {
            DeviceCommand::ClockOnly(seconds) => Some(*seconds),
            _ => None,
        })
    }

    /// Every buzzer pulse, in order.
    pub fn buzzes(&self) -> Vec<BuzzerKind> {
        self.commands()
            .iter()
            .filter_map(|command| match command {
                DeviceCommand::Buzz { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    fn record(&self, command: DeviceCommand) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }
}

impl DeviceSink for RecordingSink {
    fn set_clock_only(&self, seconds: i32) {
        self.record(DeviceCommand::ClockOnly(seconds));
    }

    fn set_twenty_four(&self, seconds: i32) {
        self.record(DeviceCommand::TwentyFour(seconds));
    }

    fn set_buzz(&self, kind: BuzzerKind, duration: Duration) {
        self.record(DeviceCommand::Buzz { kind, duration });
    }

    fn show_twenty_four_seconds(&self, visible: bool) {
        self.record(DeviceCommand::ShowTwentyFour(visible));
    }

    fn switch_twenty_four_seconds(&self) {
        self.record(DeviceCommand::SwitchTwentyFour);
    }

    fn clear_board(&self) {
        self.record(DeviceCommand::ClearBoard);
    }
}
