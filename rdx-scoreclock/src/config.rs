//! Defines all configuration structures for the scoreboard clocks.
//!
//! These structs are designed to be deserialized from a configuration file
//! (a TOML file) using `serde`, layered with `SCOREBOARD__*` environment
//! variables through the `config` crate. Every field has a default matching
//! the stock scoreboard, so an empty or missing file is a valid configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// The top-level configuration for the `ScoreboardEngine`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreboardConfig {
    /// Tick periods for the clock schedulers.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Clock limits and reset values.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Buzzer pulse lengths.
    #[serde(default)]
    pub buzzers: BuzzerConfig,

    /// How commands reach the scoreboard hardware.
    #[serde(default)]
    pub device: DeviceConfig,

    /// The paired (mirrored) scoreboard, if any.
    #[serde(default)]
    pub relay: RelayConfig,
}

impl ScoreboardConfig {
    /// Loads the configuration from an optional TOML file, then applies
    /// `SCOREBOARD__<SECTION>__<KEY>` environment overrides.
    ///
    /// A `path` that does not exist is not an error; the defaults (plus any
    /// environment overrides) are used instead.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("Reading scoreboard configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("SCOREBOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to assemble scoreboard configuration sources")?;

        let config: ScoreboardConfig = settings
            .try_deserialize()
            .context("invalid scoreboard configuration")?;
        info!(
            "Configuration loaded: fast tick {:?}, device mode {:?}, relay {}",
            config.timing.fast_tick(),
            config.device.mode,
            if config.relay.enabled { "enabled" } else { "disabled" }
        );
        Ok(config)
    }
}

/// Tick periods driving the clocks.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Base period of the game and shot clock tickers, in milliseconds.
    /// Each second of clock time is accumulated from several fast ticks.
    #[serde(default = "default_fast_tick_ms")]
    pub fast_tick_ms: u64,

    /// Period of the timeout clock ticker, in milliseconds.
    #[serde(default = "default_timeout_tick_ms")]
    pub timeout_tick_ms: u64,
}

impl TimingConfig {
    pub fn fast_tick(&self) -> Duration {
        Duration::from_millis(self.fast_tick_ms.max(1))
    }

    pub fn timeout_tick(&self) -> Duration {
        Duration::from_millis(self.timeout_tick_ms.max(1))
    }

    /// Number of fast ticks that make up one second of clock time.
    pub fn ticks_per_second(&self) -> u32 {
        let per_second = 1000 / self.fast_tick_ms.max(1);
        per_second.clamp(1, u32::MAX as u64) as u32
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fast_tick_ms: default_fast_tick_ms(),
            timeout_tick_ms: default_timeout_tick_ms(),
        }
    }
}

/// Clock limits and reset values, all in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// The full shot clock value.
    #[serde(default = "default_shot_clock_seconds")]
    pub shot_clock_seconds: i32,

    /// The shortened shot clock value (offensive rebound).
    #[serde(default = "default_fourteen_seconds")]
    pub fourteen_seconds: i32,

    /// The length of a timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: i32,

    /// Remaining timeout seconds at which the attention buzzer warns.
    #[serde(default = "default_timeout_warning_seconds")]
    pub timeout_warning_seconds: i32,

    /// Period length for count-up (football) games.
    #[serde(default = "default_football_duration")]
    pub football_duration: i32,

    /// Highest value a manual game clock edit may reach.
    #[serde(default = "default_max_period_seconds")]
    pub max_period_seconds: i32,

    /// Highest value a manual game clock edit may reach in kids mode.
    #[serde(default = "default_kids_max_period_seconds")]
    pub kids_max_period_seconds: i32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            shot_clock_seconds: default_shot_clock_seconds(),
            fourteen_seconds: default_fourteen_seconds(),
            timeout_seconds: default_timeout_seconds(),
            timeout_warning_seconds: default_timeout_warning_seconds(),
            football_duration: default_football_duration(),
            max_period_seconds: default_max_period_seconds(),
            kids_max_period_seconds: default_kids_max_period_seconds(),
        }
    }
}

/// Buzzer pulse lengths, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct BuzzerConfig {
    /// Pulse used when no explicit duration is given.
    #[serde(default = "default_buzz_ms")]
    pub default_ms: u64,

    /// Pulse used by the timeout clock for its warnings.
    #[serde(default = "default_timeout_buzz_ms")]
    pub timeout_ms: u64,
}

impl BuzzerConfig {
    pub fn default_pulse(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    pub fn timeout_pulse(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BuzzerConfig {
    fn default() -> Self {
        Self {
            default_ms: default_buzz_ms(),
            timeout_ms: default_timeout_buzz_ms(),
        }
    }
}

/// Whether device commands are executed or only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    /// Run the display binary and drive the GPIO pins.
    Exec,
    /// Log every command without touching the hardware.
    DryRun,
}

/// Hardware wiring of the scoreboard.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_device_mode")]
    pub mode: DeviceMode,

    /// The display driver binary that talks SPI to the LED matrices.
    #[serde(default = "default_score_binary")]
    pub score_binary: PathBuf,

    /// Root of the sysfs GPIO tree.
    #[serde(default = "default_gpio_base")]
    pub gpio_base: PathBuf,

    /// GPIO line numbers, BCM numbering.
    #[serde(default)]
    pub pins: GpioPins,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            mode: default_device_mode(),
            score_binary: default_score_binary(),
            gpio_base: default_gpio_base(),
            pins: GpioPins::default(),
        }
    }
}

/// Output lines for the buzzers and the shot clock LED enable.
#[derive(Debug, Clone, Deserialize)]
pub struct GpioPins {
    #[serde(default = "default_end_quarter_pin")]
    pub end_quarter: u32,
    #[serde(default = "default_end_twenty_four_pin")]
    pub end_twenty_four: u32,
    #[serde(default = "default_attention_pin")]
    pub attention: u32,
    /// Active low: driving the line low shows the shot clock digits.
    #[serde(default = "default_twenty_four_leds_pin")]
    pub twenty_four_leds: u32,
}

impl Default for GpioPins {
    fn default() -> Self {
        Self {
            end_quarter: default_end_quarter_pin(),
            end_twenty_four: default_end_twenty_four_pin(),
            attention: default_attention_pin(),
            twenty_four_leds: default_twenty_four_leds_pin(),
        }
    }
}

/// The paired scoreboard that mirrors this one.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the paired scoreboard's consumer endpoint.
    #[serde(default = "default_relay_base_url")]
    pub base_url: String,

    #[serde(default = "default_relay_timeout_ms")]
    pub timeout_ms: u64,
}

impl RelayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_relay_base_url(),
            timeout_ms: default_relay_timeout_ms(),
        }
    }
}

// --- Default value functions for serde ---

fn default_fast_tick_ms() -> u64 {
    100
}

fn default_timeout_tick_ms() -> u64 {
    1000
}

fn default_shot_clock_seconds() -> i32 {
    24
}

fn default_fourteen_seconds() -> i32 {
    14
}

fn default_timeout_seconds() -> i32 {
    60
}

fn default_timeout_warning_seconds() -> i32 {
    10
}

fn default_football_duration() -> i32 {
    600
}

fn default_max_period_seconds() -> i32 {
    600
}

fn default_kids_max_period_seconds() -> i32 {
    240
}

fn default_buzz_ms() -> u64 {
    2000
}

fn default_timeout_buzz_ms() -> u64 {
    1000
}

fn default_device_mode() -> DeviceMode {
    DeviceMode::DryRun
}

fn default_score_binary() -> PathBuf {
    PathBuf::from("/home/pi/score")
}

fn default_gpio_base() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

fn default_end_quarter_pin() -> u32 {
    23
}

fn default_end_twenty_four_pin() -> u32 {
    24
}

fn default_attention_pin() -> u32 {
    25
}

fn default_twenty_four_leds_pin() -> u32 {
    18
}

fn default_relay_base_url() -> String {
    "http://192.168.1.100:8080/api/broadcast/consumer".to_string()
}

fn default_relay_timeout_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_stock_board() {
        let config = ScoreboardConfig::default();
        assert_eq!(config.timing.ticks_per_second(), 10);
        assert_eq!(config.rules.shot_clock_seconds, 24);
        assert_eq!(config.rules.fourteen_seconds, 14);
        assert_eq!(config.rules.timeout_seconds, 60);
        assert_eq!(config.buzzers.default_pulse(), Duration::from_secs(2));
        assert_eq!(config.device.mode, DeviceMode::DryRun);
        assert!(!config.relay.enabled);
    }

    #[test]
    fn ticks_per_second_never_drops_to_zero() {
        let timing = TimingConfig {
            fast_tick_ms: 5000,
            timeout_tick_ms: 1000,
        };
        assert_eq!(timing.ticks_per_second(), 1);

        let timing = TimingConfig {
            fast_tick_ms: 0,
            timeout_tick_ms: 1000,
        };
        assert_eq!(timing.fast_tick(), Duration::from_millis(1));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScoreboardConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.rules.football_duration, 600);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[timing]
fast_tick_ms = 50

[device]
mode = "exec"
score_binary = "/opt/score"

[device.pins]
attention = 7

[relay]
enabled = true
"#
        )
        .unwrap();

        let config = ScoreboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.timing.ticks_per_second(), 20);
        assert_eq!(config.timing.timeout_tick_ms, 1000);
        assert_eq!(config.device.mode, DeviceMode::Exec);
        assert_eq!(config.device.score_binary, PathBuf::from("/opt/score"));
        assert_eq!(config.device.pins.attention, 7);
        assert_eq!(config.device.pins.end_quarter, 23);
        assert!(config.relay.enabled);
        assert_eq!(config.rules.shot_clock_seconds, 24);
    }
}
