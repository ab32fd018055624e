//! The engine's tickers running on (paused) tokio time.

use scoreclock::config::ScoreboardConfig;
use scoreclock::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn engine() -> (ScoreboardEngine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let engine = ScoreboardEngine::new(ScoreboardConfig::default(), sink.clone(), Arc::new(NoRelay));
    (engine, sink)
}

#[tokio::test(start_paused = true)]
async fn tickers_drive_the_clocks_until_shutdown() {
    let (engine, _sink) = engine();
    let mut system = engine.subscribe_system_events();

    engine.load_game(600, GameMode::Basket, false).unwrap();
    engine.resume_game_clock().unwrap();
    engine.start_shot_clock().unwrap();
    engine.start().await;
    assert_eq!(system.recv().await.unwrap(), SystemEvent::EngineStarted);

    // Second boundaries land on the first fast tick, then every second.
    tokio::time::sleep(Duration::from_millis(2150)).await;
    assert_eq!(engine.game_clock_seconds(), 597);
    assert_eq!(engine.shot_clock_value(), 22);

    engine.shutdown().await;
    assert_eq!(system.recv().await.unwrap(), SystemEvent::EngineShutdown);

    // Clocks keep their state, but nothing ticks any more.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(engine.game_clock_seconds(), 597);
    assert!(engine.game_clock().is_running());
}

#[tokio::test(start_paused = true)]
async fn second_start_registers_nothing() {
    let (engine, _sink) = engine();
    let mut system = engine.subscribe_system_events();
    engine.start().await;
    engine.start().await;

    engine.load_game(100, GameMode::Basket, false).unwrap();
    engine.resume_game_clock().unwrap();
    tokio::time::sleep(Duration::from_millis(1150)).await;
    assert_eq!(engine.game_clock_seconds(), 98);

    engine.shutdown().await;
    assert_eq!(system.recv().await.unwrap(), SystemEvent::EngineStarted);
    assert_eq!(system.recv().await.unwrap(), SystemEvent::EngineShutdown);
}

#[tokio::test(start_paused = true)]
async fn timeout_ticks_once_per_second() {
    let (engine, sink) = engine();
    engine.start().await;

    engine.start_timeout().unwrap();
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(engine.timeout_value(), 50);
    assert_eq!(sink.buzzes(), Vec::<BuzzerKind>::new());

    tokio::time::sleep(Duration::from_secs(50)).await;
    assert!(!engine.timeout_clock().is_running());
    assert_eq!(engine.timeout_value(), 0);
    assert_eq!(sink.buzzes(), vec![BuzzerKind::Attention, BuzzerKind::Attention]);
    assert_eq!(sink.last_twenty_four(), Some(24));

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn timeout_started_between_ticks_lasts_a_full_minute() {
    let (engine, sink) = engine();
    engine.start().await;

    // Almost a full timeout period into the ticker's cycle.
    tokio::time::sleep(Duration::from_millis(999)).await;
    engine.start_timeout().unwrap();

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(engine.timeout_value(), 60);
    tokio::time::sleep(Duration::from_millis(996)).await;
    assert_eq!(engine.timeout_value(), 60);
    tokio::time::sleep(Duration::from_millis(4)).await;
    assert_eq!(engine.timeout_value(), 59);

    // 59.5s after the start: one second still to go.
    tokio::time::sleep(Duration::from_millis(58_498)).await;
    assert!(engine.timeout_clock().is_running());
    assert_eq!(engine.timeout_value(), 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!engine.timeout_clock().is_running());
    assert_eq!(engine.timeout_value(), 0);
    assert_eq!(sink.buzzes(), vec![BuzzerKind::Attention, BuzzerKind::Attention]);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn second_timeout_is_phased_to_its_own_start() {
    let (engine, _sink) = engine();
    engine.start().await;

    engine.start_timeout().unwrap();
    tokio::time::sleep(Duration::from_millis(2300)).await;
    assert_eq!(engine.timeout_value(), 58);
    engine.stop_timeout().unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    engine.start_timeout().unwrap();
    tokio::time::sleep(Duration::from_millis(950)).await;
    assert_eq!(engine.timeout_value(), 60);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.timeout_value(), 59);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn game_clock_started_between_fast_ticks_updates_on_the_next_one() {
    let (engine, sink) = engine();
    engine.start().await;
    engine.load_game(100, GameMode::Basket, false).unwrap();

    // Fast ticks land every 100ms; start halfway between two of them.
    tokio::time::sleep(Duration::from_millis(450)).await;
    engine.resume_game_clock().unwrap();

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(engine.game_clock_seconds(), 100);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(engine.game_clock_seconds(), 99);
    assert_eq!(sink.last_clock(), Some(99));

    // Then once per second, counted from that first update.
    tokio::time::sleep(Duration::from_millis(980)).await;
    assert_eq!(engine.game_clock_seconds(), 99);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(engine.game_clock_seconds(), 98);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shot_clock_started_between_fast_ticks_shows_full_value_on_the_next_one() {
    let (engine, sink) = engine();
    engine.start().await;

    tokio::time::sleep(Duration::from_millis(730)).await;
    engine.start_shot_clock().unwrap();
    assert_eq!(engine.shot_clock_value(), 25);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(engine.shot_clock_value(), 25);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(engine.shot_clock_value(), 24);
    assert_eq!(sink.last_twenty_four(), Some(24));

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(engine.shot_clock_value(), 23);

    engine.shutdown().await;
}
