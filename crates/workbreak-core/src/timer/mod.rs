mod engine;
mod format;

pub use engine::{TimerEngine, TimerState};
pub use format::format_time;
