//! Countdown engine implementation.
//!
//! The engine is a caller-ticked state machine. It does not own a thread
//! or an interval timer - the frontend calls `tick()` once per second
//! while the countdown runs. A tick delivered in any other state is
//! ignored, so a late tick can never resurrect a paused countdown or
//! double-fire expiry.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --toggle--> Running --tick(remaining==1)--> Expired
//! Running --toggle--> Idle (remaining retained)
//! Expired --toggle--> Running (refill + clear exercise + silence alarm)
//! any --reset--> Idle (alarm off, remaining and exercise retained)
//! ```
//!
//! Expiry is one indivisible transition: the tick that brings remaining
//! time to zero stops the engine, activates the alarm and selects the
//! next exercise.

use chrono::Utc;
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmNotifier, NullAlarm};
use crate::error::CoreError;
use crate::events::Event;
use crate::exercises::parse_exercise_list;
use crate::settings::{RotationMode, Settings};
use crate::storage::KvStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    /// The countdown reached zero and the alarm is playing. A later
    /// `reset()` moves back to `Idle` with remaining time still zero.
    Expired,
}

/// Core countdown engine.
///
/// Owns the timer state, alarm state, rotation cursor, current exercise
/// and settings as one unit, so every transition in the module diagram is
/// a single method call. Settings changes write through to the attached
/// store; timer state and the current exercise are never persisted - a
/// fresh engine always starts `Idle` at the full duration.
pub struct TimerEngine {
    settings: Settings,
    store: Option<Box<dyn KvStore>>,
    alarm: Box<dyn AlarmNotifier>,
    state: TimerState,
    remaining_secs: u64,
    /// Next sequential index; meaningful only for sequential rotation.
    /// Reset to 0 whenever the exercise text changes.
    cursor: usize,
    current_exercise: Option<String>,
    alarm_playing: bool,
    rng: Mcg128Xsl64,
}

impl TimerEngine {
    /// Create an engine with no store or alarm device attached.
    pub fn new(settings: Settings) -> Self {
        Self::with_seed(settings, rand::thread_rng().gen())
    }

    /// Create an engine with a fixed RNG seed (for deterministic tests).
    pub fn with_seed(settings: Settings, seed: u64) -> Self {
        let remaining_secs = settings.total_seconds();
        Self {
            settings,
            store: None,
            alarm: Box::new(NullAlarm),
            state: TimerState::Idle,
            remaining_secs,
            cursor: 0,
            current_exercise: None,
            alarm_playing: false,
            rng: Mcg128Xsl64::seed_from_u64(seed),
        }
    }

    /// Load settings from the store and attach it for write-through.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn load(store: Box<dyn KvStore>) -> Result<Self, CoreError> {
        let settings = Settings::load(store.as_ref())?;
        let mut engine = Self::new(settings);
        engine.store = Some(store);
        Ok(engine)
    }

    /// Attach the alarm device driven on expiry and acknowledgment.
    pub fn set_alarm(&mut self, alarm: Box<dyn AlarmNotifier>) {
        self.alarm = alarm;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_exercise(&self) -> Option<&str> {
        self.current_exercise.as_deref()
    }

    pub fn alarm_playing(&self) -> bool {
        self.alarm_playing
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Single start/pause toggle.
    ///
    /// Starting from a fully-elapsed countdown first silences the alarm,
    /// refills the remaining time from the current settings and clears the
    /// displayed exercise. Toggling while running pauses, retaining the
    /// remaining time.
    pub fn toggle(&mut self) -> Event {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Idle;
                Event::TimerPaused {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                }
            }
            TimerState::Idle | TimerState::Expired => {
                if self.remaining_secs == 0 {
                    self.silence_alarm();
                    self.remaining_secs = self.settings.total_seconds();
                    self.current_exercise = None;
                }
                self.state = TimerState::Running;
                Event::TimerStarted {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                }
            }
        }
    }

    /// Advance the countdown by one second. Call once per second while
    /// running; ignored in any other state.
    ///
    /// Returns `Some(Event::TimerExpired)` on the tick that brings
    /// remaining time to zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }
        self.state = TimerState::Expired;
        self.alarm_playing = true;
        self.alarm.activate();
        self.select_exercise();
        Some(Event::TimerExpired {
            exercise: self.current_exercise.clone(),
            at: Utc::now(),
        })
    }

    /// Stop and silence: halts the countdown and the alarm without
    /// restoring the remaining time or clearing the displayed exercise.
    pub fn reset(&mut self) -> Event {
        self.silence_alarm();
        self.state = TimerState::Idle;
        Event::TimerReset {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }

    /// Set the minutes part. Negative input coerces to 0. The remaining
    /// time is rebased to the new duration even while running.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store write fails.
    pub fn set_minutes(&mut self, raw: i64) -> Result<u64, CoreError> {
        let minutes = Settings::clamp_minutes(raw);
        self.settings.set_minutes(minutes);
        self.remaining_secs = self.settings.total_seconds();
        self.persist()?;
        Ok(minutes)
    }

    /// Set the seconds part, clamped into `[0, 59]`. The remaining time is
    /// rebased to the new duration even while running.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store write fails.
    pub fn set_seconds(&mut self, raw: i64) -> Result<u64, CoreError> {
        let seconds = Settings::clamp_seconds(raw);
        self.settings.set_seconds(seconds);
        self.remaining_secs = self.settings.total_seconds();
        self.persist()?;
        Ok(seconds)
    }

    /// Replace the raw exercise text. The sequential cursor restarts at 0,
    /// treating the new text as a fresh list.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store write fails.
    pub fn set_exercises_text(&mut self, text: &str) -> Result<(), CoreError> {
        self.settings.set_exercises_text(text);
        self.cursor = 0;
        self.persist()
    }

    /// Switch between sequential and random rotation.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store write fails.
    pub fn set_rotation_mode(&mut self, mode: RotationMode) -> Result<(), CoreError> {
        self.settings.set_rotation_mode(mode);
        self.persist()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist(&self) -> Result<(), CoreError> {
        if let Some(store) = &self.store {
            self.settings.save(store.as_ref())?;
        }
        Ok(())
    }

    fn silence_alarm(&mut self) {
        if self.alarm_playing {
            self.alarm.silence();
            self.alarm_playing = false;
        }
    }

    fn select_exercise(&mut self) {
        let list = parse_exercise_list(self.settings.exercises_text());
        if list.is_empty() {
            return;
        }
        let index = match self.settings.rotation_mode() {
            RotationMode::Random => self.rng.gen_range(0..list.len()),
            // Modulo defends against the list shrinking since the cursor
            // was last advanced.
            RotationMode::Sequential => self.cursor % list.len(),
        };
        self.current_exercise = Some(list[index].clone());
        self.cursor = (index + 1) % list.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingAlarm {
        activations: Arc<AtomicUsize>,
        silences: Arc<AtomicUsize>,
    }

    impl AlarmNotifier for CountingAlarm {
        fn activate(&mut self) {
            self.activations.fetch_add(1, Ordering::SeqCst);
        }
        fn silence(&mut self) {
            self.silences.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_alarm() -> (Box<CountingAlarm>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let activations = Arc::new(AtomicUsize::new(0));
        let silences = Arc::new(AtomicUsize::new(0));
        let alarm = Box::new(CountingAlarm {
            activations: Arc::clone(&activations),
            silences: Arc::clone(&silences),
        });
        (alarm, activations, silences)
    }

    fn settings(minutes: u64, seconds: u64, exercises: &str, mode: RotationMode) -> Settings {
        let mut s = Settings::default();
        s.set_minutes(minutes);
        s.set_seconds(seconds);
        s.set_exercises_text(exercises);
        s.set_rotation_mode(mode);
        s
    }

    /// Start the engine and tick until it expires.
    fn run_to_expiry(engine: &mut TimerEngine) {
        engine.toggle();
        while engine.state() == TimerState::Running {
            engine.tick();
        }
        assert_eq!(engine.state(), TimerState::Expired);
    }

    #[test]
    fn initial_remaining_matches_duration() {
        let engine = TimerEngine::with_seed(settings(1, 5, "", RotationMode::Sequential), 1);
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.remaining_secs(), 65);
        assert!(engine.current_exercise().is_none());
    }

    #[test]
    fn exactly_r_ticks_reach_expiry() {
        let mut engine = TimerEngine::with_seed(settings(0, 3, "", RotationMode::Sequential), 1);
        engine.toggle();
        assert!(engine.tick().is_none());
        assert!(engine.tick().is_none());
        let event = engine.tick();
        assert!(matches!(event, Some(Event::TimerExpired { .. })));
        assert_eq!(engine.state(), TimerState::Expired);
        assert_eq!(engine.remaining_secs(), 0);
        // A would-be extra tick is ignored.
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_secs(), 0);
    }

    #[test]
    fn tick_while_paused_is_ignored() {
        let mut engine = TimerEngine::with_seed(settings(0, 10, "", RotationMode::Sequential), 1);
        engine.toggle();
        engine.tick();
        engine.toggle(); // pause
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_secs(), 9);
    }

    #[test]
    fn pause_retains_remaining_and_resume_continues() {
        let mut engine = TimerEngine::with_seed(settings(0, 5, "", RotationMode::Sequential), 1);
        engine.toggle();
        engine.tick();
        engine.tick();
        let paused = engine.toggle();
        assert!(matches!(
            paused,
            Event::TimerPaused { remaining_secs: 3, .. }
        ));
        let resumed = engine.toggle();
        assert!(matches!(
            resumed,
            Event::TimerStarted { remaining_secs: 3, .. }
        ));
    }

    #[test]
    fn expiry_activates_alarm_and_selects_exercise() {
        let mut engine = TimerEngine::with_seed(
            settings(0, 2, "Pushups\nSquats", RotationMode::Sequential),
            1,
        );
        let (alarm, activations, _) = counting_alarm();
        engine.set_alarm(alarm);

        run_to_expiry(&mut engine);
        assert!(engine.alarm_playing());
        assert_eq!(activations.load(Ordering::SeqCst), 1);
        assert_eq!(engine.current_exercise(), Some("Pushups"));
    }

    #[test]
    fn empty_list_leaves_exercise_unset() {
        let mut engine = TimerEngine::with_seed(settings(0, 1, "", RotationMode::Sequential), 1);
        run_to_expiry(&mut engine);
        assert!(engine.current_exercise().is_none());
        assert!(engine.alarm_playing());
    }

    #[test]
    fn sequential_rotation_visits_in_order_and_wraps() {
        let mut engine = TimerEngine::with_seed(
            settings(0, 1, "A\nB\nC", RotationMode::Sequential),
            1,
        );
        let mut seen = Vec::new();
        for _ in 0..4 {
            run_to_expiry(&mut engine);
            seen.push(engine.current_exercise().unwrap().to_string());
        }
        assert_eq!(seen, vec!["A", "B", "C", "A"]);
    }

    #[test]
    fn random_rotation_eventually_covers_all_indices() {
        let mut engine =
            TimerEngine::with_seed(settings(0, 1, "A\nB\nC", RotationMode::Random), 42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            run_to_expiry(&mut engine);
            seen.insert(engine.current_exercise().unwrap().to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn reset_silences_but_preserves_remaining_and_exercise() {
        let mut engine = TimerEngine::with_seed(
            settings(0, 2, "Pushups", RotationMode::Sequential),
            1,
        );
        let (alarm, _, silences) = counting_alarm();
        engine.set_alarm(alarm);

        run_to_expiry(&mut engine);
        let event = engine.reset();
        assert!(matches!(event, Event::TimerReset { remaining_secs: 0, .. }));
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(!engine.alarm_playing());
        assert_eq!(silences.load(Ordering::SeqCst), 1);
        assert_eq!(engine.remaining_secs(), 0);
        assert_eq!(engine.current_exercise(), Some("Pushups"));
    }

    #[test]
    fn reset_while_running_keeps_remaining() {
        let mut engine = TimerEngine::with_seed(settings(0, 10, "", RotationMode::Sequential), 1);
        engine.toggle();
        engine.tick();
        engine.tick();
        engine.reset();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.remaining_secs(), 8);
    }

    #[test]
    fn toggle_from_expired_refills_and_clears() {
        let mut engine = TimerEngine::with_seed(
            settings(0, 5, "Pushups", RotationMode::Sequential),
            1,
        );
        let (alarm, _, silences) = counting_alarm();
        engine.set_alarm(alarm);

        run_to_expiry(&mut engine);
        assert_eq!(engine.current_exercise(), Some("Pushups"));
        assert!(engine.alarm_playing());

        let event = engine.toggle();
        assert!(matches!(
            event,
            Event::TimerStarted { remaining_secs: 5, .. }
        ));
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.remaining_secs(), 5);
        assert!(engine.current_exercise().is_none());
        assert!(!engine.alarm_playing());
        assert_eq!(silences.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn toggle_from_post_expired_idle_also_refills() {
        let mut engine = TimerEngine::with_seed(
            settings(0, 3, "Pushups", RotationMode::Sequential),
            1,
        );
        run_to_expiry(&mut engine);
        engine.reset(); // Idle with remaining == 0, alarm off.
        let event = engine.toggle();
        assert!(matches!(
            event,
            Event::TimerStarted { remaining_secs: 3, .. }
        ));
        assert!(engine.current_exercise().is_none());
    }

    #[test]
    fn duration_change_rebases_remaining_while_idle() {
        let mut engine = TimerEngine::with_seed(settings(0, 10, "", RotationMode::Sequential), 1);
        engine.set_minutes(2).unwrap();
        assert_eq!(engine.remaining_secs(), 130);
        engine.set_seconds(0).unwrap();
        assert_eq!(engine.remaining_secs(), 120);
    }

    #[test]
    fn duration_change_rebases_remaining_while_running() {
        let mut engine = TimerEngine::with_seed(settings(0, 10, "", RotationMode::Sequential), 1);
        engine.toggle();
        engine.tick();
        engine.tick();
        assert_eq!(engine.remaining_secs(), 8);
        engine.set_seconds(30).unwrap();
        assert_eq!(engine.remaining_secs(), 30);
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn setter_input_is_normalized() {
        let mut engine = TimerEngine::with_seed(settings(0, 0, "", RotationMode::Sequential), 1);
        assert_eq!(engine.set_minutes(-5).unwrap(), 0);
        assert_eq!(engine.set_seconds(99).unwrap(), 59);
        assert_eq!(engine.remaining_secs(), 59);
    }

    #[test]
    fn changing_text_resets_cursor() {
        let mut engine = TimerEngine::with_seed(
            settings(0, 1, "A\nB\nC", RotationMode::Sequential),
            1,
        );
        run_to_expiry(&mut engine);
        assert_eq!(engine.current_exercise(), Some("A"));

        engine.set_exercises_text("X\nY\nZ").unwrap();
        run_to_expiry(&mut engine);
        assert_eq!(engine.current_exercise(), Some("X"));
    }

    #[test]
    fn changing_text_resets_cursor_in_random_mode_too() {
        let mut engine =
            TimerEngine::with_seed(settings(0, 1, "A\nB", RotationMode::Random), 7);
        run_to_expiry(&mut engine);
        engine.set_exercises_text("P\nQ").unwrap();
        engine.set_rotation_mode(RotationMode::Sequential).unwrap();
        run_to_expiry(&mut engine);
        assert_eq!(engine.current_exercise(), Some("P"));
    }

    #[test]
    fn sequential_cursor_survives_list_shrinking() {
        let mut engine = TimerEngine::with_seed(
            settings(0, 1, "A\nB\nC\nD", RotationMode::Sequential),
            1,
        );
        run_to_expiry(&mut engine);
        run_to_expiry(&mut engine);
        run_to_expiry(&mut engine); // cursor now 3
        // Shrink the list behind the cursor's back, without the setter
        // that resets it.
        engine.settings.set_exercises_text("A\nB");
        run_to_expiry(&mut engine);
        // 3 % 2 == 1
        assert_eq!(engine.current_exercise(), Some("B"));
    }

    #[test]
    fn settings_changes_write_through_to_store() {
        let store = MemoryStore::new();
        let mut engine = TimerEngine::load(Box::new(store.clone())).unwrap();
        engine.set_minutes(12).unwrap();
        engine.set_seconds(34).unwrap();
        engine.set_exercises_text("Pushups").unwrap();
        engine.set_rotation_mode(RotationMode::Random).unwrap();

        assert_eq!(store.get("minutes").unwrap().as_deref(), Some("12"));
        assert_eq!(store.get("seconds").unwrap().as_deref(), Some("34"));
        assert_eq!(store.get("exercises").unwrap().as_deref(), Some("Pushups"));
        assert_eq!(store.get("isRandom").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn load_starts_idle_at_full_duration() {
        let store = MemoryStore::new();
        store.set("minutes", "0").unwrap();
        store.set("seconds", "42").unwrap();
        let engine = TimerEngine::load(Box::new(store)).unwrap();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.remaining_secs(), 42);
    }

    #[test]
    fn zero_duration_expires_on_first_tick() {
        let mut engine =
            TimerEngine::with_seed(settings(0, 0, "Pushups", RotationMode::Sequential), 1);
        engine.toggle();
        let event = engine.tick();
        assert!(matches!(event, Some(Event::TimerExpired { .. })));
        assert_eq!(engine.current_exercise(), Some("Pushups"));
    }
}
