//! Exercise list model.
//!
//! The raw multi-line text is the persisted artifact; the list is derived
//! on every read and never stored independently.

/// Parse a newline-delimited text blob into an ordered list of exercises.
///
/// Lines are trimmed and blank lines are dropped. An empty list is valid.
pub fn parse_exercise_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
