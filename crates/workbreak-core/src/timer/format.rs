/// Render a second count as `M:SS` with zero-padded seconds.
///
/// Minutes are not padded or wrapped: `format_time(3900)` is `"65:00"`.
pub fn format_time(total_secs: u64) -> String {
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{mins}:{secs:02}")
}
