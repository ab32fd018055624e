use anyhow::Result;
use scoreclock::config::DeviceMode;
use scoreclock::prelude::*;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // 2. Load the configuration. The demo never touches real hardware.
    let config_path = std::env::var_os("SCOREBOARD_CONFIG").map(PathBuf::from);
    let mut config = ScoreboardConfig::load(config_path.as_deref())?;
    config.device.mode = DeviceMode::DryRun;

    // 3. Create the engine.
    let engine = ScoreboardEngine::with_hardware(config)?;

    // 4. Spawn concurrent tasks to listen to the event streams.
    spawn_event_listeners(&engine);

    // 5. Start the tickers and play a short scripted sequence.
    engine.start().await;
    play_demo_sequence(&engine).await;

    // 6. Keep running until Ctrl+C.
    info!("Demo sequence done. Press Ctrl+C to exit.");
    tokio::signal::ctrl_c().await?;
    engine.shutdown().await;

    Ok(())
}

/// Spawns tasks that log every event the engine broadcasts.
fn spawn_event_listeners(engine: &ScoreboardEngine) {
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            info!("[SYSTEM] => {:?}", event);
        }
    });

    let mut clock_rx = engine.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = clock_rx.recv().await {
            match event {
                ClockEvent::Updated { .. } => {}
                other => info!("[CLOCK] => {:?}", other),
            }
        }
    });
}

/// Walks through a shot clock run, a timeout and a period end.
async fn play_demo_sequence(engine: &ScoreboardEngine) {
    let step = |label: &str, result: Result<(), Rejection>| match result {
        Ok(()) => info!("[DEMO] {}", label),
        Err(e) => warn!("[DEMO] {} rejected: {}", label, e),
    };

    step("load game", engine.load_game(30, GameMode::Basket, false));
    step("start game clock", engine.resume_game_clock());
    step("start shot clock", engine.start_shot_clock());
    tokio::time::sleep(Duration::from_secs(3)).await;

    // Refused: the game clock is still running.
    step("start timeout", engine.start_timeout());

    if let Ok(seconds) = engine.stop_game_clock() {
        info!("[DEMO] game clock stopped at {}s", seconds);
    }
    step("start timeout", engine.start_timeout());
    // Refused: the timeout owns the shot clock digits.
    step("start shot clock", engine.start_shot_clock());
    tokio::time::sleep(Duration::from_secs(3)).await;
    step("stop timeout", engine.stop_timeout());

    step("fourteen", engine.fourteen_shot_clock());
    step("resume game clock", engine.resume_game_clock());
}
