//! The engine that owns the three clocks and enforces the rules between them.

use crate::common::{BuzzerKind, ClockKind, GameMode, TickerId};
use crate::components::{GameClock, ShotClock, Tick, TimeoutClock};
use crate::config::ScoreboardConfig;
use crate::device::{CommandSink, DeviceSink};
use crate::error::Rejection;
use crate::events::{ClockEvent, EventBus, SystemEvent};
use crate::relay::{HttpRelay, NoRelay, Relay};
use crate::scheduler::TickScheduler;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

/// Operator intent that outlives a single clock run.
#[derive(Debug, Default)]
struct PolicyState {
    /// Set when the operator starts the shot clock, cleared when they stop it.
    /// While set, a reset or fourteen restarts an idle shot clock.
    shot_clock_armed: bool,
}

/// A point-in-time view of all three clocks.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreboardStatus {
    pub taken_at: DateTime<Utc>,
    pub mode: GameMode,
    pub mirrored: bool,
    pub game_clock: i32,
    pub game_clock_running: bool,
    pub shot_clock: i32,
    pub shot_clock_running: bool,
    pub timeout_clock: i32,
    pub timeout_running: bool,
}

/// The main scoreboard engine.
///
/// This struct is the central point of control. It builds the clocks once,
/// registers their tickers, and is the only place that enforces the rules
/// between them: a timeout needs a stopped game clock, and the shot clock
/// can't be started or edited during a timeout. The engine is designed to be
/// cloned and shared across tasks; every clone drives the same clocks.
#[derive(Clone)]
pub struct ScoreboardEngine {
    config: Arc<ScoreboardConfig>,
    game_clock: Arc<GameClock>,
    shot_clock: Arc<ShotClock>,
    timeout_clock: Arc<TimeoutClock>,
    sink: Arc<dyn DeviceSink>,
    relay: Arc<dyn Relay>,
    events: EventBus,
    system_event_sender: broadcast::Sender<SystemEvent>,
    scheduler: TickScheduler,
    tickers: Arc<RwLock<Vec<TickerId>>>,
    policy: Arc<Mutex<PolicyState>>,
}

// Core implementation block for construction and lifecycle.
impl ScoreboardEngine {
    /// Creates an engine around explicit device and relay collaborators.
    pub fn new(config: ScoreboardConfig, sink: Arc<dyn DeviceSink>, relay: Arc<dyn Relay>) -> Self {
        let events = EventBus::default();
        let (system_event_sender, _) = broadcast::channel(16);
        let ticks_per_second = config.timing.ticks_per_second();
        let rules = &config.rules;

        let game_clock = Arc::new(GameClock::new(
            sink.clone(),
            relay.clone(),
            events.clone(),
            ticks_per_second,
            rules.football_duration,
        ));
        let shot_clock = Arc::new(ShotClock::new(
            sink.clone(),
            events.clone(),
            ticks_per_second,
            rules.shot_clock_seconds,
            rules.fourteen_seconds,
        ));
        let timeout_clock = Arc::new(TimeoutClock::new(
            shot_clock.clone(),
            sink.clone(),
            events.clone(),
            rules.timeout_seconds,
            rules.timeout_warning_seconds,
            config.buzzers.timeout_pulse(),
        ));

        Self {
            config: Arc::new(config),
            game_clock,
            shot_clock,
            timeout_clock,
            sink,
            relay,
            events,
            system_event_sender,
            scheduler: TickScheduler::new(),
            tickers: Arc::new(RwLock::new(Vec::new())),
            policy: Arc::new(Mutex::new(PolicyState::default())),
        }
    }

    /// Creates an engine wired to the scoreboard hardware and, when enabled,
    /// the paired scoreboard. Must be called from within a tokio runtime.
    pub fn with_hardware(config: ScoreboardConfig) -> anyhow::Result<Self> {
        let (sink, _driver) = CommandSink::spawn(config.device.clone(), config.buzzers.default_pulse());
        let relay: Arc<dyn Relay> = if config.relay.enabled {
            info!("Mirroring to {}", config.relay.base_url);
            Arc::new(HttpRelay::new(&config.relay)?)
        } else {
            Arc::new(NoRelay)
        };
        Ok(Self::new(config, Arc::new(sink), relay))
    }

    /// Registers the clock tickers. Calling it again while running does nothing.
    pub async fn start(&self) {
        let mut tickers = self.tickers.write().await;
        if !tickers.is_empty() {
            warn!("Scoreboard engine already started");
            return;
        }
        let timing = &self.config.timing;
        let game: Arc<dyn Tick> = self.game_clock.clone();
        let shot: Arc<dyn Tick> = self.shot_clock.clone();
        let timeout: Arc<dyn Tick> = self.timeout_clock.clone();
        tickers.push(self.scheduler.schedule("game", timing.fast_tick(), game).await);
        tickers.push(self.scheduler.schedule("shot", timing.fast_tick(), shot).await);
        tickers.push(
            self.scheduler
                .schedule_with_phase(
                    "timeout",
                    timing.timeout_tick(),
                    timeout,
                    self.timeout_clock.phase(),
                )
                .await,
        );
        self.system_event_sender.send(SystemEvent::EngineStarted).ok();
        info!("Scoreboard engine started.");
    }

    /// Cancels every ticker. Clock values are kept.
    pub async fn shutdown(&self) {
        self.tickers.write().await.clear();
        self.scheduler.shutdown().await;
        self.system_event_sender.send(SystemEvent::EngineShutdown).ok();
        info!("Scoreboard engine has shut down.");
    }

    /// Starts the engine and runs it until Ctrl+C.
    pub async fn run(&self) -> anyhow::Result<()> {
        self.start().await;
        info!("Scoreboard running. Press Ctrl+C to shut down.");
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received.");
        self.shutdown().await;
        Ok(())
    }

    fn policy(&self) -> MutexGuard<'_, PolicyState> {
        self.policy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Game clock operations.
impl ScoreboardEngine {
    /// Starts the game clock from `seconds`.
    pub fn start_game_clock(
        &self,
        seconds: i32,
        mode: GameMode,
        mirrored: bool,
    ) -> Result<(), Rejection> {
        let _policy = self.policy();
        if self.game_clock.is_running() {
            return Err(Rejection::AlreadyRunning(ClockKind::Game));
        }
        if seconds <= 0 {
            return Err(Rejection::NothingToCount {
                clock: ClockKind::Game,
                seconds,
            });
        }
        self.game_clock.start(seconds, mode, mirrored);
        Ok(())
    }

    /// Restarts the game clock from its current value, mode and mirroring.
    pub fn resume_game_clock(&self) -> Result<(), Rejection> {
        self.start_game_clock(
            self.game_clock.seconds(),
            self.game_clock.mode(),
            self.game_clock.is_mirrored(),
        )
    }

    /// Stops the game clock and returns the value it stopped at.
    pub fn stop_game_clock(&self) -> Result<i32, Rejection> {
        if !self.game_clock.is_running() {
            return Err(Rejection::NotRunning(ClockKind::Game));
        }
        self.game_clock.stop();
        Ok(self.game_clock.seconds())
    }

    /// Restarts the game clock as a plain countdown from `seconds`.
    ///
    /// A running clock is replaced. A refused countdown leaves it running.
    pub fn countdown(&self, seconds: i32, mirrored: bool) -> Result<(), Rejection> {
        let _policy = self.policy();
        if seconds <= 0 {
            return Err(Rejection::NothingToCount {
                clock: ClockKind::Game,
                seconds,
            });
        }
        self.game_clock.stop();
        self.game_clock.start(seconds, GameMode::Basket, mirrored);
        Ok(())
    }

    /// Adds `delta` (which may be negative) to a stopped game clock.
    pub fn adjust_game_clock(&self, delta: i32) -> Result<i32, Rejection> {
        if self.game_clock.is_running() {
            return Err(Rejection::MustBeStopped(ClockKind::Game));
        }
        let rules = &self.config.rules;
        let requested = self.game_clock.seconds().saturating_add(delta);
        if requested < 0 || requested > rules.max_period_seconds {
            return Err(Rejection::OutOfRange {
                clock: ClockKind::Game,
                requested,
                min: 0,
                max: rules.max_period_seconds,
            });
        }
        let mode = self.game_clock.mode();
        if mode == GameMode::BasketKids && requested > rules.kids_max_period_seconds {
            return Err(Rejection::PeriodLimit {
                mode,
                max: rules.kids_max_period_seconds,
            });
        }
        self.game_clock.set_seconds(requested);
        Ok(requested)
    }

    /// Seeds a new game: game clock display, mode, mirroring and a full shot clock.
    pub fn load_game(&self, seconds: i32, mode: GameMode, mirrored: bool) -> Result<(), Rejection> {
        if self.game_clock.is_running() {
            return Err(Rejection::MustBeStopped(ClockKind::Game));
        }
        if self.timeout_clock.is_running() {
            return Err(Rejection::TimeoutRunning);
        }
        self.policy().shot_clock_armed = false;
        self.shot_clock.stop();
        self.shot_clock.reset();
        self.game_clock.configure(mode, mirrored);
        if mirrored {
            self.relay.push_new_game();
        }
        self.game_clock.set_seconds(seconds);
        info!("Loaded {} game at {}s (mirrored: {})", mode, seconds, mirrored);
        Ok(())
    }

    pub fn game_clock_seconds(&self) -> i32 {
        self.game_clock.seconds()
    }
}

// Shot clock operations.
impl ScoreboardEngine {
    /// Starts the shot clock and arms its automatic restart.
    pub fn start_shot_clock(&self) -> Result<(), Rejection> {
        let mut policy = self.policy();
        if self.timeout_clock.is_running() {
            return Err(Rejection::TimeoutRunning);
        }
        if self.shot_clock.is_running() {
            return Err(Rejection::AlreadyRunning(ClockKind::Shot));
        }
        let seconds = self.shot_clock.value();
        if seconds <= 0 {
            return Err(Rejection::NothingToCount {
                clock: ClockKind::Shot,
                seconds,
            });
        }
        policy.shot_clock_armed = true;
        self.shot_clock.start();
        Ok(())
    }

    /// Stops the shot clock and disarms its automatic restart.
    pub fn stop_shot_clock(&self) -> Result<i32, Rejection> {
        let mut policy = self.policy();
        policy.shot_clock_armed = false;
        if !self.shot_clock.is_running() {
            return Err(Rejection::NotRunning(ClockKind::Shot));
        }
        self.shot_clock.stop();
        Ok(self.shot_clock.value())
    }

    /// Puts the shot clock back to its full value.
    ///
    /// A running clock keeps running; an idle one restarts if the operator
    /// had started it (e.g. after it ran out).
    pub fn reset_shot_clock(&self) -> Result<(), Rejection> {
        let policy = self.policy();
        if self.timeout_clock.is_running() {
            return Err(Rejection::TimeoutRunning);
        }
        self.shot_clock.reset();
        if policy.shot_clock_armed {
            self.shot_clock.start();
        }
        Ok(())
    }

    /// Forces the shot clock to the short value, with the same restart rules
    /// as [`reset_shot_clock`](Self::reset_shot_clock).
    pub fn fourteen_shot_clock(&self) -> Result<(), Rejection> {
        let policy = self.policy();
        if self.timeout_clock.is_running() {
            return Err(Rejection::TimeoutRunning);
        }
        self.shot_clock.set_fourteen();
        if policy.shot_clock_armed {
            self.shot_clock.start();
        }
        Ok(())
    }

    /// Adds one second to an idle shot clock, up to its full value.
    pub fn increment_shot_clock(&self) -> Result<i32, Rejection> {
        self.step_shot_clock(1)
    }

    /// Removes one second from an idle shot clock, down to one.
    pub fn decrement_shot_clock(&self) -> Result<i32, Rejection> {
        self.step_shot_clock(-1)
    }

    fn step_shot_clock(&self, delta: i32) -> Result<i32, Rejection> {
        let _policy = self.policy();
        if self.shot_clock.is_running() {
            return Err(Rejection::MustBeStopped(ClockKind::Shot));
        }
        if self.timeout_clock.is_running() {
            return Err(Rejection::TimeoutRunning);
        }
        let max = self.shot_clock.full_seconds();
        let current = self.shot_clock.value();
        let requested = current + delta;
        let allowed = if delta > 0 { current < max } else { current > 1 };
        if !allowed {
            return Err(Rejection::OutOfRange {
                clock: ClockKind::Shot,
                requested,
                min: 1,
                max,
            });
        }
        self.shot_clock.set_value(requested);
        Ok(requested)
    }

    /// Shows the shot clock, or toggles its blanking when the game clock is
    /// within the shot clock's range (the shot clock is meaningless then).
    pub fn show_shot_clock(&self) {
        let seconds = self.game_clock.seconds();
        if seconds > 0 && seconds <= self.shot_clock.full_seconds() {
            self.shot_clock.toggle_visible();
        } else {
            self.shot_clock.set_visible(true);
        }
    }

    pub fn shot_clock_value(&self) -> i32 {
        self.shot_clock.value()
    }
}

// Timeout and miscellaneous operations.
impl ScoreboardEngine {
    /// Starts a timeout, suspending a running shot clock.
    pub fn start_timeout(&self) -> Result<(), Rejection> {
        let _policy = self.policy();
        if self.game_clock.is_running() {
            return Err(Rejection::GameClockRunning);
        }
        if self.timeout_clock.is_running() {
            return Err(Rejection::AlreadyRunning(ClockKind::Timeout));
        }
        self.timeout_clock.start();
        Ok(())
    }

    /// Ends a running timeout early, restoring the shot clock display.
    pub fn stop_timeout(&self) -> Result<(), Rejection> {
        let _policy = self.policy();
        if !self.timeout_clock.is_running() {
            return Err(Rejection::NotRunning(ClockKind::Timeout));
        }
        self.timeout_clock.stop();
        Ok(())
    }

    pub fn timeout_value(&self) -> i32 {
        self.timeout_clock.timeout_value()
    }

    /// Sounds the referee attention buzzer.
    pub fn sound_attention(&self) {
        info!("Attention buzzer requested");
        self.sink.buzz(BuzzerKind::Attention);
    }

    /// Blanks the board. Clock values and running states are untouched.
    pub fn clear_board(&self) {
        info!("Clearing the board");
        self.sink.clear_board();
    }

    pub fn status(&self) -> ScoreboardStatus {
        ScoreboardStatus {
            taken_at: Utc::now(),
            mode: self.game_clock.mode(),
            mirrored: self.game_clock.is_mirrored(),
            game_clock: self.game_clock.seconds(),
            game_clock_running: self.game_clock.is_running(),
            shot_clock: self.shot_clock.value(),
            shot_clock_running: self.shot_clock.is_running(),
            timeout_clock: self.timeout_clock.timeout_value(),
            timeout_running: self.timeout_clock.is_running(),
        }
    }

    pub fn game_clock(&self) -> &Arc<GameClock> {
        &self.game_clock
    }

    pub fn shot_clock(&self) -> &Arc<ShotClock> {
        &self.shot_clock
    }

    pub fn timeout_clock(&self) -> &Arc<TimeoutClock> {
        &self.timeout_clock
    }

    pub fn config(&self) -> &ScoreboardConfig {
        &self.config
    }

    /// Subscribes to the `ClockEvent` stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClockEvent> {
        self.events.subscribe()
    }

    /// Subscribes to the `SystemEvent` stream.
    pub fn subscribe_system_events(&self) -> broadcast::Receiver<SystemEvent> {
        self.system_event_sender.subscribe()
    }
}
