use std::io::Read;

use clap::Subcommand;
use workbreak_core::exercises::parse_exercise_list;
use workbreak_core::storage::Database;
use workbreak_core::timer::TimerEngine;

#[derive(Subcommand)]
pub enum ExercisesAction {
    /// List the parsed exercises in rotation order
    List,
    /// Replace the exercise list (entries as arguments, or one per line on
    /// stdin when none are given)
    Set { entries: Vec<String> },
    /// Append one exercise to the list
    Add { name: String },
    /// Remove all exercises
    Clear,
}

pub fn run(action: ExercisesAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = TimerEngine::load(Box::new(Database::open()?))?;

    match action {
        ExercisesAction::List => {
            let list = parse_exercise_list(engine.settings().exercises_text());
            if list.is_empty() {
                println!("No exercises configured.");
            }
            for (i, exercise) in list.iter().enumerate() {
                println!("{}. {exercise}", i + 1);
            }
        }
        ExercisesAction::Set { entries } => {
            let text = if entries.is_empty() {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                entries.join("\n")
            };
            engine.set_exercises_text(&text)?;
            let count = parse_exercise_list(engine.settings().exercises_text()).len();
            println!("{count} exercise(s) configured.");
        }
        ExercisesAction::Add { name } => {
            let mut text = engine.settings().exercises_text().to_string();
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&name);
            engine.set_exercises_text(&text)?;
            println!("Added: {name}");
        }
        ExercisesAction::Clear => {
            engine.set_exercises_text("")?;
            println!("Exercise list cleared.");
        }
    }
    Ok(())
}
