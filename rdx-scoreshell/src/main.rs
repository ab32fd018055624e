use anyhow::Result;
use colored::Colorize;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use scoreclock::prelude::*;
use scoreclock::{ENGINE_NAME, VERSION as LIB_VERSION};
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

const LOGO_TEXT: &str = r"
   ____                        _            _
  / ___|  ___ ___  _ __ ___ __| | ___   ___| | __
  \___ \ / __/ _ \| '__/ _ \ __| |/ _ \ / __| |/ /
   ___) | (_| (_) | | |  __/ (__| | (_) | (__|   <
  |____/ \___\___/|_|  \___|\___|_|\___/ \___|_|\_\
";

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            Cow::Owned(format!("{} {}", command.yellow().bold(), rest.yellow()))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    println!("{}", LOGO_TEXT.cyan());
    println!("{}", "-".repeat(64).dimmed());
    println!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!("{}", "-".repeat(64).dimmed());
}

/// Spawns the listeners that print engine events to the console.
///
/// Clock events are only printed while `watching` is set.
fn spawn_event_listeners(engine: &ScoreboardEngine, watching: Arc<AtomicBool>) {
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            println!("\n<-- [SYSTEM EVENT] {:?}", event);
        }
    });

    let mut clock_rx = engine.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = clock_rx.recv().await {
            if !watching.load(Ordering::Relaxed) {
                continue;
            }
            match event {
                ClockEvent::Buzzer { kind } => println!("<-- [BUZZER] {:?}", kind),
                other => println!("<-- [CLOCK] {:?}", other),
            }
        }
    });
}

/// Prints the outcome of an engine operation.
fn report<T>(result: Result<T, Rejection>, done: impl FnOnce(T) -> String) {
    match result {
        Ok(value) => println!("--> {}", done(value)),
        Err(rejection) => println!("{} {}", "Rejected:".red().bold(), rejection),
    }
}

fn parse_seconds(arg: Option<&&str>, usage: &str) -> Option<i32> {
    match arg.map(|s| s.parse::<i32>()) {
        Some(Ok(seconds)) => Some(seconds),
        Some(Err(_)) => {
            println!("Error: '{}' is not a valid number of seconds.", arg.copied().unwrap_or_default());
            None
        }
        None => {
            println!("Usage: {}", usage);
            None
        }
    }
}

/// Turns `clock inc|dec <seconds>` into the delta for the engine, or `None`
/// if it doesn't fit in an `i32`.
fn signed_delta(direction: &str, seconds: i32) -> Option<i32> {
    if direction == "dec" {
        seconds.checked_neg()
    } else {
        Some(seconds)
    }
}

fn clock_command(engine: &ScoreboardEngine, args: &[&str]) {
    match args.get(1).copied() {
        Some("start") => report(engine.resume_game_clock(), |_| {
            format!("Game clock running from {}s.", engine.game_clock_seconds())
        }),
        Some("stop") => report(engine.stop_game_clock(), |s| format!("Game clock stopped at {}s.", s)),
        Some(direction @ ("inc" | "dec")) => {
            let Some(seconds) = parse_seconds(args.get(2), "clock inc|dec <SECONDS>") else {
                return;
            };
            match signed_delta(direction, seconds) {
                Some(delta) => {
                    report(engine.adjust_game_clock(delta), |s| format!("Game clock now {}s.", s))
                }
                None => println!("Error: can't {} the clock by {}s.", direction, seconds),
            }
        }
        Some("countdown") => {
            if let Some(seconds) = parse_seconds(args.get(2), "clock countdown <SECONDS> [mirrored]") {
                let mirrored = args.get(3) == Some(&"mirrored");
                report(engine.countdown(seconds, mirrored), |_| {
                    format!("Counting down from {}s.", seconds)
                });
            }
        }
        _ => println!("Usage: clock start|stop|inc <S>|dec <S>|countdown <S> [mirrored]"),
    }
}

fn game_command(engine: &ScoreboardEngine, args: &[&str]) {
    if args.get(1) != Some(&"load") {
        println!("Unknown 'game' command. Try 'game load'.");
        return;
    }
    let usage = "game load <SECONDS> <football|basket|kids> [mirrored]";
    let Some(seconds) = parse_seconds(args.get(2), usage) else {
        return;
    };
    let mode = match args.get(3).map(|m| m.parse::<GameMode>()) {
        Some(Ok(mode)) => mode,
        Some(Err(e)) => {
            println!("Error: {}", e);
            return;
        }
        None => {
            println!("Usage: {}", usage);
            return;
        }
    };
    let mirrored = args.get(4) == Some(&"mirrored");
    report(engine.load_game(seconds, mode, mirrored), |_| {
        format!("Loaded {} game at {}s.", mode, seconds)
    });
}

fn shot_command(engine: &ScoreboardEngine, args: &[&str]) {
    match args.get(1).copied() {
        Some("start") => report(engine.start_shot_clock(), |_| "Shot clock running.".to_string()),
        Some("stop") => report(engine.stop_shot_clock(), |s| format!("Shot clock stopped at {}s.", s)),
        Some("reset") => report(engine.reset_shot_clock(), |_| "Shot clock reset.".to_string()),
        Some("14") => report(engine.fourteen_shot_clock(), |_| "Shot clock at 14.".to_string()),
        Some("inc") => report(engine.increment_shot_clock(), |s| format!("Shot clock now {}s.", s)),
        Some("dec") => report(engine.decrement_shot_clock(), |s| format!("Shot clock now {}s.", s)),
        Some("show") => {
            engine.show_shot_clock();
            println!("--> Shot clock display updated.");
        }
        _ => println!("Usage: shot start|stop|reset|14|inc|dec|show"),
    }
}

fn timeout_command(engine: &ScoreboardEngine, args: &[&str]) {
    match args.get(1).copied() {
        Some("start") => report(engine.start_timeout(), |_| "Timeout running.".to_string()),
        Some("stop") => report(engine.stop_timeout(), |_| "Timeout ended.".to_string()),
        _ => println!("Usage: timeout start|stop"),
    }
}

fn print_status(engine: &ScoreboardEngine) {
    match serde_json::to_string_pretty(&engine.status()) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("Error: could not render status: {}", e),
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  game load <S> <MODE> [mirrored] - Seeds a game (football, basket, kids).");
    println!("  clock start|stop                - Starts or stops the game clock.");
    println!("  clock inc|dec <S>               - Adjusts a stopped game clock.");
    println!("  clock countdown <S> [mirrored]  - Restarts the game clock as a countdown.");
    println!("  shot start|stop|reset|14        - Drives the shot clock.");
    println!("  shot inc|dec                    - Steps a stopped shot clock by one second.");
    println!("  shot show                       - Shows or toggles the shot clock digits.");
    println!("  timeout start|stop              - Starts or ends a timeout.");
    println!("  attention                       - Sounds the attention buzzer.");
    println!("  clear                           - Blanks the board; clocks keep their values.");
    println!("  status                          - Prints all clocks as JSON.");
    println!("  watch on|off                    - Prints clock events as they happen.");
    println!("  exit                            - Stops the clocks and quits.");
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::var_os("SCOREBOARD_CONFIG").map(PathBuf::from));
    let config = ScoreboardConfig::load(config_path.as_deref())?;
    let engine = ScoreboardEngine::with_hardware(config)?;

    let watching = Arc::new(AtomicBool::new(false));
    spawn_event_listeners(&engine, watching.clone());

    info!("Starting {}...", ENGINE_NAME.cyan());
    engine.start().await;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!("{} is running. Type 'help' for commands or 'exit' to quit.", ENGINE_NAME.cyan());

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let args = line.split_whitespace().collect::<Vec<_>>();

                if let Some(command) = args.first() {
                    match *command {
                        "game" => game_command(&engine, &args),
                        "clock" => clock_command(&engine, &args),
                        "shot" => shot_command(&engine, &args),
                        "timeout" => timeout_command(&engine, &args),
                        "attention" => {
                            engine.sound_attention();
                            println!("--> Attention buzzer sounded.");
                        }
                        "clear" => {
                            engine.clear_board();
                            println!("--> Board cleared.");
                        }
                        "status" => print_status(&engine),
                        "watch" => match args.get(1).copied() {
                            Some("on") => {
                                watching.store(true, Ordering::Relaxed);
                                println!("--> Watching clock events.");
                            }
                            Some("off") => {
                                watching.store(false, Ordering::Relaxed);
                                println!("--> Stopped watching clock events.");
                            }
                            _ => println!("Usage: watch on|off"),
                        },
                        "help" => print_help(),
                        "exit" => break,
                        _ => println!("Unknown command: '{}'. Type 'help'.", line),
                    }
                }
            }
            Err(_) => {
                println!("Exiting scoreshell...");
                break;
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_negates_the_seconds() {
        assert_eq!(signed_delta("inc", 30), Some(30));
        assert_eq!(signed_delta("dec", 30), Some(-30));
        assert_eq!(signed_delta("dec", -5), Some(5));
    }

    #[test]
    fn unrepresentable_decrement_is_refused() {
        assert_eq!(signed_delta("dec", i32::MIN), None);
        assert_eq!(signed_delta("inc", i32::MIN), Some(i32::MIN));
    }
}
