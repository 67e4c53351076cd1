//! Timer settings and their persistence bridge.
//!
//! Four values survive restarts, stored as strings in the key-value
//! settings store:
//! - `exercises` -- the raw multi-line exercise text, verbatim
//! - `minutes` / `seconds` -- the countdown duration parts
//! - `isRandom` -- `"true"` when the rotation mode is random
//!
//! Every change is written through immediately; there is no debouncing.
//! Absent keys fall back to the documented defaults (30:00, empty list,
//! sequential rotation). Numeric garbage in the store is coerced to 0 and
//! clamped, never surfaced as an error.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::storage::KvStore;

pub const KEY_EXERCISES: &str = "exercises";
pub const KEY_MINUTES: &str = "minutes";
pub const KEY_SECONDS: &str = "seconds";
pub const KEY_IS_RANDOM: &str = "isRandom";

const DEFAULT_MINUTES: u64 = 30;

/// How the next exercise is picked at expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    /// Wraparound cursor through the list, in order.
    Sequential,
    /// Uniform random index; repeats allowed.
    Random,
}

/// Persisted timer settings.
///
/// Invariants: `seconds` is always in `[0, 59]`; the exercise text is
/// stored verbatim and parsed on demand via
/// [`parse_exercise_list`](crate::exercises::parse_exercise_list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    exercises_text: String,
    minutes: u64,
    seconds: u64,
    rotation_mode: RotationMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exercises_text: String::new(),
            minutes: DEFAULT_MINUTES,
            seconds: 0,
            rotation_mode: RotationMode::Sequential,
        }
    }
}

impl Settings {
    /// Coerce raw minutes input: negative or unparsable values become 0.
    pub fn clamp_minutes(raw: i64) -> u64 {
        raw.max(0) as u64
    }

    /// Coerce raw seconds input into `[0, 59]`.
    pub fn clamp_seconds(raw: i64) -> u64 {
        raw.clamp(0, 59) as u64
    }

    pub fn exercises_text(&self) -> &str {
        &self.exercises_text
    }

    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn rotation_mode(&self) -> RotationMode {
        self.rotation_mode
    }

    /// Full countdown duration in seconds.
    pub fn total_seconds(&self) -> u64 {
        self.minutes.saturating_mul(60).saturating_add(self.seconds)
    }

    pub fn set_exercises_text(&mut self, text: impl Into<String>) {
        self.exercises_text = text.into();
    }

    pub fn set_minutes(&mut self, minutes: u64) {
        self.minutes = minutes;
    }

    /// Values above 59 are clamped to keep the invariant.
    pub fn set_seconds(&mut self, seconds: u64) {
        self.seconds = seconds.min(59);
    }

    pub fn set_rotation_mode(&mut self, mode: RotationMode) {
        self.rotation_mode = mode;
    }

    /// Load settings from the store, applying defaults for absent keys.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself fails; malformed stored
    /// values are silently normalized.
    pub fn load(store: &dyn KvStore) -> Result<Self, CoreError> {
        let mut settings = Self::default();
        if let Some(text) = store.get(KEY_EXERCISES)? {
            settings.exercises_text = text;
        }
        if let Some(value) = store.get(KEY_MINUTES)? {
            settings.minutes = Self::clamp_minutes(value.trim().parse().unwrap_or(0));
        }
        if let Some(value) = store.get(KEY_SECONDS)? {
            settings.seconds = Self::clamp_seconds(value.trim().parse().unwrap_or(0));
        }
        if let Some(value) = store.get(KEY_IS_RANDOM)? {
            // Stored flag means "is random", compared directly.
            settings.rotation_mode = if value == "true" {
                RotationMode::Random
            } else {
                RotationMode::Sequential
            };
        }
        Ok(settings)
    }

    /// Write all settings through to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if any key cannot be written.
    pub fn save(&self, store: &dyn KvStore) -> Result<(), CoreError> {
        store.set(KEY_EXERCISES, &self.exercises_text)?;
        store.set(KEY_MINUTES, &self.minutes.to_string())?;
        store.set(KEY_SECONDS, &self.seconds.to_string())?;
        let is_random = self.rotation_mode == RotationMode::Random;
        store.set(KEY_IS_RANDOM, if is_random { "true" } else { "false" })?;
        Ok(())
    }
}
