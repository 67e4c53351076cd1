use workbreak_core::storage::Database;
use workbreak_core::timer::format_time;

pub fn run(limit: u32) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let records = db.recent_completions(limit)?;
    if records.is_empty() {
        println!("No completed countdowns yet.");
        return Ok(());
    }
    for record in records {
        let exercise = if record.exercise.is_empty() {
            "-"
        } else {
            record.exercise.as_str()
        };
        println!(
            "{}  {:>6}  {exercise}",
            record.completed_at.format("%Y-%m-%d %H:%M:%S"),
            format_time(record.duration_secs),
        );
    }
    Ok(())
}
