//! The production sink: commands are queued to a background driver task that
//! runs the display binary and drives the buzzer and LED lines over sysfs GPIO.

use super::{DeviceCommand, DeviceSink};
use crate::common::BuzzerKind;
use crate::config::{DeviceConfig, DeviceMode};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Queues commands for the driver task. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct CommandSink {
    sender: mpsc::UnboundedSender<DeviceCommand>,
    default_pulse: Duration,
}

impl CommandSink {
    /// Spawns the driver task and returns the sink feeding it.
    ///
    /// The task ends once every `CommandSink` clone has been dropped.
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: DeviceConfig, default_pulse: Duration) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let driver = DeviceDriver {
            config: Arc::new(config),
        };
        let handle = tokio::spawn(driver.run(receiver));
        (
            Self {
                sender,
                default_pulse,
            },
            handle,
        )
    }

    fn send(&self, command: DeviceCommand) {
        if self.sender.send(command).is_err() {
            warn!("Device driver is gone, dropping {:?}", command);
        }
    }
}

impl DeviceSink for CommandSink {
    fn set_clock_only(&self, seconds: i32) {
        self.send(DeviceCommand::ClockOnly(seconds));
    }

    fn set_twenty_four(&self, seconds: i32) {
        self.send(DeviceCommand::TwentyFour(seconds));
    }

    fn set_buzz(&self, kind: BuzzerKind, duration: Duration) {
        self.send(DeviceCommand::Buzz { kind, duration });
    }

    fn buzz(&self, kind: BuzzerKind) {
        self.set_buzz(kind, self.default_pulse);
    }

    fn show_twenty_four_seconds(&self, visible: bool) {
        self.send(DeviceCommand::ShowTwentyFour(visible));
    }

    fn switch_twenty_four_seconds(&self) {
        self.send(DeviceCommand::SwitchTwentyFour);
    }

    fn clear_board(&self) {
        self.send(DeviceCommand::ClearBoard);
    }
}

/// Formats the display binary's argument for a command, if it has one.
///
/// The game clock is sent as `-kMMSS`, the shot clock as `-tSS` and a
/// board clear as `-z`.
pub fn score_argument(command: &DeviceCommand) -> Option<String> {
    match *command {
        DeviceCommand::ClockOnly(seconds) => {
            let seconds = seconds.max(0);
            Some(format!("-k{:02}{:02}", seconds / 60, seconds % 60))
        }
        DeviceCommand::TwentyFour(seconds) => Some(format!("-t{:02}", seconds.max(0))),
        DeviceCommand::ClearBoard => Some("-z".to_string()),
        _ => None,
    }
}

#[doc(hidden)]
struct DeviceDriver {
    config: Arc<DeviceConfig>,
}

impl DeviceDriver {
    async fn run(self, mut receiver: mpsc::UnboundedReceiver<DeviceCommand>) {
        info!("Device driver started in {:?} mode", self.config.mode);
        if self.config.mode == DeviceMode::Exec {
            self.prepare_pins().await;
        }
        while let Some(command) = receiver.recv().await {
            if let Err(e) = self.execute(command).await {
                warn!("Device command {:?} failed: {:#}", command, e);
            }
        }
        debug!("Device driver stopped: all sinks dropped");
    }

    async fn execute(&self, command: DeviceCommand) -> Result<()> {
        if self.config.mode == DeviceMode::DryRun {
            info!("[DEVICE] {:?}", command);
            return Ok(());
        }
        trace!("Executing {:?}", command);
        match command {
            DeviceCommand::ClockOnly(_)
            | DeviceCommand::TwentyFour(_)
            | DeviceCommand::ClearBoard => {
                if let Some(argument) = score_argument(&command) {
                    self.run_score(&argument).await?;
                }
            }
            DeviceCommand::Buzz { kind, duration } => {
                // Pulses run beside the queue so display updates keep flowing.
                let pin = self.gpio_value_path(self.buzzer_pin(kind));
                tokio::spawn(async move {
                    if let Err(e) = pulse(pin, duration).await {
                        warn!("Buzzer {:?} pulse failed: {:#}", kind, e);
                    }
                });
            }
            DeviceCommand::ShowTwentyFour(visible) => {
                // Active low.
                let value = if visible { "0" } else { "1" };
                write_line(self.leds_path(), value).await?;
            }
            DeviceCommand::SwitchTwentyFour => {
                let path = self.leds_path();
                let current = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                let next = if current.trim() == "1" { "0" } else { "1" };
                write_line(path, next).await?;
            }
        }
        Ok(())
    }

    async fn run_score(&self, argument: &str) -> Result<()> {
        let status = Command::new(&self.config.score_binary)
            .arg(argument)
            .status()
            .await
            .with_context(|| format!("spawning {}", self.config.score_binary.display()))?;
        if !status.success() {
            bail!("{} {} exited with {}", self.config.score_binary.display(), argument, status);
        }
        Ok(())
    }

    /// Exports every configured line as an output, driven inactive.
    async fn prepare_pins(&self) {
        let pins = &self.config.pins;
        let outputs = [
            (pins.end_quarter, "0"),
            (pins.end_twenty_four, "0"),
            (pins.attention, "0"),
            (pins.twenty_four_leds, "0"),
        ];
        for (pin, initial) in outputs {
            if let Err(e) = self.export_output(pin, initial).await {
                warn!("Could not prepare GPIO {}: {:#}", pin, e);
            }
        }
    }

    async fn export_output(&self, pin: u32, initial: &str) -> Result<()> {
        let line = self.config.gpio_base.join(format!("gpio{}", pin));
        if tokio::fs::metadata(&line).await.is_err() {
            write_line(self.config.gpio_base.join("export"), &pin.to_string()).await?;
        }
        write_line(line.join("direction"), "out").await?;
        write_line(line.join("value"), initial).await
    }

    fn buzzer_pin(&self, kind: BuzzerKind) -> u32 {
        match kind {
            BuzzerKind::EndQuarter => self.config.pins.end_quarter,
            BuzzerKind::EndTwentyFour => self.config.pins.end_twenty_four,
            BuzzerKind::Attention => self.config.pins.attention,
        }
    }

    fn leds_path(&self) -> PathBuf {
        self.gpio_value_path(self.config.pins.twenty_four_leds)
    }

    fn gpio_value_path(&self, pin: u32) -> PathBuf {
        self.config
            .gpio_base
            .join(format!("gpio{}", pin))
            .join("value")
    }
}

async fn pulse(path: PathBuf, duration: Duration) -> Result<()> {
    write_line(path.clone(), "1").await?;
    tokio::time::sleep(duration).await;
    write_line(path, "0").await
}

async fn write_line(path: PathBuf, value: &str) -> Result<()> {
    tokio::fs::write(&path, value)
        .await
        .with_context(|| format!("writing '{}' to {}", value, path.display()))
}
