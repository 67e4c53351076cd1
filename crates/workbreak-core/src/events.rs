use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every engine transition produces an Event. Frontends render from these
/// instead of polling engine internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero: alarm on, exercise selected (if any).
    TimerExpired {
        exercise: Option<String>,
        at: DateTime<Utc>,
    },
    TimerReset {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
}
