use clap::Subcommand;
use workbreak_core::storage::Database;
use workbreak_core::timer::TimerEngine;
use workbreak_core::RotationMode;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print all settings as JSON
    Show,
    /// Get a single setting (minutes, seconds, random)
    Get { key: String },
    /// Set a single setting. Invalid numbers are coerced, not rejected.
    Set { key: String, value: String },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = TimerEngine::load(Box::new(Database::open()?))?;

    match action {
        ConfigAction::Show => {
            let settings = engine.settings();
            let view = serde_json::json!({
                "minutes": settings.minutes(),
                "seconds": settings.seconds(),
                "rotation_mode": settings.rotation_mode(),
                "exercises_text": settings.exercises_text(),
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        ConfigAction::Get { key } => match key.as_str() {
            "minutes" => println!("{}", engine.settings().minutes()),
            "seconds" => println!("{}", engine.settings().seconds()),
            "random" => println!(
                "{}",
                engine.settings().rotation_mode() == RotationMode::Random
            ),
            other => return Err(format!("unknown setting: {other}").into()),
        },
        ConfigAction::Set { key, value } => match key.as_str() {
            "minutes" => {
                let minutes = engine.set_minutes(value.trim().parse().unwrap_or(0))?;
                tracing::debug!(minutes, "duration updated");
                println!("minutes = {minutes}");
            }
            "seconds" => {
                let seconds = engine.set_seconds(value.trim().parse().unwrap_or(0))?;
                tracing::debug!(seconds, "duration updated");
                println!("seconds = {seconds}");
            }
            "random" => {
                let mode = if value.trim() == "true" {
                    RotationMode::Random
                } else {
                    RotationMode::Sequential
                };
                engine.set_rotation_mode(mode)?;
                println!("random = {}", mode == RotationMode::Random);
            }
            other => return Err(format!("unknown setting: {other}").into()),
        },
    }
    Ok(())
}
