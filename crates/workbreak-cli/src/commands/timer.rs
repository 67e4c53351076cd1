use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use clap::Subcommand;
use workbreak_core::alarm::AlarmNotifier;
use workbreak_core::exercises::parse_exercise_list;
use workbreak_core::storage::Database;
use workbreak_core::timer::{format_time, TimerEngine, TimerState};
use workbreak_core::Event;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run countdown rounds interactively
    Run {
        /// Number of rounds to run (0 = until interrupted)
        #[arg(long, default_value = "1")]
        rounds: u32,
        /// Suppress the terminal bell on expiry
        #[arg(long)]
        quiet: bool,
    },
    /// Print current settings and countdown state as JSON
    Status,
}

/// Terminal bell standing in for the looping audio device. The bell is a
/// one-shot, so `silence` has nothing to do.
struct TerminalBell {
    quiet: bool,
}

impl AlarmNotifier for TerminalBell {
    fn activate(&mut self) {
        if !self.quiet {
            print!("\x07");
            let _ = io::stdout().flush();
        }
    }

    fn silence(&mut self) {}
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run { rounds, quiet } => run_rounds(rounds, quiet),
        TimerAction::Status => status(),
    }
}

fn run_rounds(rounds: u32, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    // The engine owns its own settings store connection; this one records
    // completion history.
    let db = Database::open()?;
    let mut engine = TimerEngine::load(Box::new(Database::open()?))?;
    engine.set_alarm(Box::new(TerminalBell { quiet }));

    let mut completed = 0u32;
    loop {
        // Starts the first round, or rearms from a fully-elapsed state
        // (silencing the alarm and clearing the previous exercise).
        engine.toggle();
        tracing::debug!(remaining_secs = engine.remaining_secs(), "round started");

        // This loop is the one-second tick source; it stops the moment the
        // engine leaves Running.
        while engine.state() == TimerState::Running {
            print!("\r{}   ", format_time(engine.remaining_secs()));
            io::stdout().flush()?;
            thread::sleep(Duration::from_secs(1));
            if let Some(Event::TimerExpired { exercise, at }) = engine.tick() {
                println!("\r{}   ", format_time(0));
                match exercise.as_deref() {
                    Some(name) => println!("Time's up! Exercise: {name}"),
                    None => println!("Time's up!"),
                }
                db.record_completion(engine.settings().total_seconds(), exercise.as_deref(), at)?;
            }
        }

        completed += 1;
        if rounds != 0 && completed >= rounds {
            engine.reset();
            break;
        }

        print!("Press Enter to start the next round... ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
    }
    Ok(())
}

fn status() -> Result<(), Box<dyn std::error::Error>> {
    let engine = TimerEngine::load(Box::new(Database::open()?))?;
    let settings = engine.settings();
    let view = serde_json::json!({
        "state": engine.state(),
        "remaining": format_time(engine.remaining_secs()),
        "remaining_secs": engine.remaining_secs(),
        "minutes": settings.minutes(),
        "seconds": settings.seconds(),
        "rotation_mode": settings.rotation_mode(),
        "exercises": parse_exercise_list(settings.exercises_text()),
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
