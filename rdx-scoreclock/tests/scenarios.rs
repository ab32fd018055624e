//! End-to-end clock scenarios driven tick by tick against a recording sink.

use scoreclock::config::ScoreboardConfig;
use scoreclock::device::DeviceCommand;
use scoreclock::prelude::*;
use std::sync::Arc;

fn engine() -> (ScoreboardEngine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let engine = ScoreboardEngine::new(ScoreboardConfig::default(), sink.clone(), Arc::new(NoRelay));
    (engine, sink)
}

/// Ticks a fast-ticking clock through `seconds` one-second boundaries.
fn run_seconds(clock: &dyn Tick, seconds: usize, ticks_per_second: usize) {
    for _ in 0..seconds * ticks_per_second {
        clock.tick();
    }
}

#[test]
fn scenario_a_shot_clock_runs_out_and_resets() {
    let (engine, sink) = engine();
    let shot = engine.shot_clock().clone();
    assert_eq!(shot.value(), 24);

    engine.start_shot_clock().unwrap();
    assert_eq!(shot.value(), 25);

    sink.take();
    run_seconds(shot.as_ref(), 25, 10);

    let shown: Vec<i32> = sink
        .commands()
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::TwentyFour(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(shown, (0..=24).rev().collect::<Vec<_>>());
    assert_eq!(sink.buzzes(), vec![BuzzerKind::EndTwentyFour]);
    assert_eq!(shot.value(), 24);
    assert!(!shot.is_running());

    // Stays stopped until someone starts it again.
    run_seconds(shot.as_ref(), 3, 10);
    assert_eq!(shot.value(), 24);
}

#[test]
fn scenario_b_basket_period_ends_after_exactly_n_updates() {
    let (engine, sink) = engine();
    let game = engine.game_clock().clone();
    engine.start_game_clock(600, GameMode::Basket, false).unwrap();

    run_seconds(game.as_ref(), 599, 10);
    assert!(game.is_running());
    assert_eq!(game.seconds(), 1);
    assert!(sink.buzzes().is_empty());

    run_seconds(game.as_ref(), 1, 10);
    assert!(!game.is_running());
    assert_eq!(game.seconds(), 0);
    assert_eq!(sink.buzzes(), vec![BuzzerKind::EndQuarter]);

    let updates = sink
        .commands()
        .iter()
        .filter(|c| matches!(c, DeviceCommand::ClockOnly(_)))
        .count();
    assert_eq!(updates, 600);
}

#[test]
fn countdown_update_count_does_not_depend_on_fast_tick() {
    for fast_tick_ms in [10, 50, 100, 250, 1000] {
        let sink = Arc::new(RecordingSink::new());
        let mut config = ScoreboardConfig::default();
        config.timing.fast_tick_ms = fast_tick_ms;
        let per_second = config.timing.ticks_per_second() as usize;
        let engine = ScoreboardEngine::new(config, sink.clone(), Arc::new(NoRelay));

        engine.start_game_clock(45, GameMode::BasketKids, false).unwrap();
        run_seconds(engine.game_clock().as_ref(), 50, per_second);

        let updates = sink
            .commands()
            .iter()
            .filter(|c| matches!(c, DeviceCommand::ClockOnly(_)))
            .count();
        assert_eq!(updates, 45, "fast tick {}ms", fast_tick_ms);
        assert_eq!(sink.buzzes(), vec![BuzzerKind::EndQuarter]);
    }
}

#[test]
fn scenario_c_timeout_runs_out_and_restores_shot_clock() {
    let (engine, sink) = engine();
    let shot = engine.shot_clock().clone();
    let timeout = engine.timeout_clock().clone();

    shot.set_value(11);
    engine.start_shot_clock().unwrap();
    run_seconds(shot.as_ref(), 1, 10);
    assert_eq!(shot.value(), 10);

    engine.start_timeout().unwrap();
    assert!(!shot.is_running());
    assert_eq!(timeout.saved_shot_clock(), 10);

    sink.take();
    for _ in 0..60 {
        timeout.tick();
    }
    assert!(!timeout.is_running());
    assert_eq!(timeout.timeout_value(), 0);
    assert_eq!(sink.last_twenty_four(), Some(10));
    assert_eq!(
        sink.buzzes(),
        vec![BuzzerKind::Attention, BuzzerKind::Attention]
    );

    // Restored, not resumed.
    assert!(!shot.is_running());
    assert_eq!(shot.value(), 10);
}

#[test]
fn scenario_d_early_stop_restores_saved_value() {
    let (engine, sink) = engine();
    let shot = engine.shot_clock().clone();
    let timeout = engine.timeout_clock().clone();

    shot.set_value(18);
    engine.start_timeout().unwrap();
    for _ in 0..25 {
        timeout.tick();
    }
    assert_eq!(timeout.timeout_value(), 35);
    assert_eq!(sink.last_twenty_four(), Some(35));

    engine.stop_timeout().unwrap();
    assert_eq!(sink.last_twenty_four(), Some(18));
    assert!(sink.buzzes().is_empty());
}
