//! # Scoreclock
//!
//! Clock coordination for a hardware sports scoreboard.
//!
//! Scoreclock runs the three clocks of a scoreboard side by side and keeps
//! them consistent with each other while driving a write-only display and
//! buzzer device.
//!
//! ## Core Concepts
//!
//! - **GameClock**: counts the period up (football) or down (basketball) and
//!   sounds the end-of-period buzzer.
//! - **ShotClock**: the 24 second clock; buzzes and resets when it runs out.
//! - **TimeoutClock**: a 60 second countdown that suspends the shot clock and
//!   restores its value when the timeout ends.
//! - **ScoreboardEngine**: owns the clocks, registers their tickers, and is the
//!   single place that enforces the rules between them.
//! - **DeviceSink**: the fire-and-forget boundary to the hardware. Clock state
//!   is authoritative no matter what the hardware does with a command.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use scoreclock::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Load the configuration (defaults plus SCOREBOARD__* overrides).
//!     let config = ScoreboardConfig::load(None)?;
//!
//!     // 2. Create the engine wired to the hardware.
//!     let engine = ScoreboardEngine::with_hardware(config)?;
//!
//!     // 3. Subscribe to the event stream.
//!     let mut events = engine.subscribe_events();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Clock event: {:?}", event);
//!         }
//!     });
//!
//!     // 4. Seed a game and start the clock.
//!     engine.load_game(600, GameMode::Basket, false)?;
//!     engine.resume_game_clock()?;
//!
//!     // 5. Run until Ctrl+C.
//!     engine.run().await?;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Scoreclock Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod common;
pub mod components;
pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod events;
pub mod relay;
pub mod scheduler;

/// A prelude module for easy importing of the most common scoreclock types.
pub mod prelude {
    pub use crate::common::{BuzzerKind, ClockKind, GameMode, TickerId};
    pub use crate::components::{GameClock, ShotClock, Tick, TimeoutClock};
    pub use crate::config::ScoreboardConfig;
    pub use crate::device::{DeviceSink, RecordingSink};
    pub use crate::engine::{ScoreboardEngine, ScoreboardStatus};
    pub use crate::error::Rejection;
    pub use crate::events::{ClockEvent, SystemEvent};
    pub use crate::relay::{NoRelay, Relay};
}
