//! Contains common, primitive types shared by the clocks, the engine and the
//! device layer.
//!
//! This module defines the identifiers for registered tickers, the sport modes
//! that decide which way the game clock runs, and the buzzer kinds understood
//! by the scoreboard hardware.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;
use std::str::FromStr;

new_key_type! {
    /// Uniquely and safely identifies a periodic ticker registered with the
    /// `TickScheduler`.
    ///
    /// The key is returned when a clock is scheduled and is the handle used to
    /// cancel it again. Keys are never reused, so a stale handle cannot cancel
    /// a newer ticker.
    pub struct TickerId;
}

/// The sport (or sport variant) being played.
///
/// The mode decides whether the game clock counts up towards a fixed period
/// length or counts down towards zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Football: the clock counts up until the configured period duration.
    Football,
    /// Basketball: the clock counts down to zero.
    #[default]
    Basket,
    /// Youth basketball: counts down, with shorter periods.
    BasketKids,
}

impl GameMode {
    /// Returns `true` when the game clock runs upwards in this mode.
    pub fn counts_up(self) -> bool {
        matches!(self, GameMode::Football)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GameMode::Football => "football",
            GameMode::Basket => "basket",
            GameMode::BasketKids => "basket_kids",
        };
        f.write_str(label)
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "football" => Ok(GameMode::Football),
            "basket" => Ok(GameMode::Basket),
            "basket_kids" | "kids" => Ok(GameMode::BasketKids),
            other => Err(format!(
                "unknown game mode '{}' (valid: football, basket, basket_kids)",
                other
            )),
        }
    }
}

/// The buzzers wired to the scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuzzerKind {
    /// End of a period (quarter).
    EndQuarter,
    /// The shot clock ran out.
    EndTwentyFour,
    /// Referee attention signal, also used by the timeout clock.
    Attention,
}

/// Names the three clocks, mostly for events and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    Game,
    Shot,
    Timeout,
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClockKind::Game => "game clock",
            ClockKind::Shot => "shot clock",
            ClockKind::Timeout => "timeout clock",
        };
        f.write_str(label)
    }
}
