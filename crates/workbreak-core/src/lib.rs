//! # Workbreak Core Library
//!
//! Core logic for Workbreak, a configurable work-break countdown timer
//! that prompts an exercise when time runs out. All operations are
//! available to any frontend; the bundled CLI binary is a thin layer over
//! this crate.
//!
//! ## Architecture
//!
//! - **Countdown Engine**: a caller-ticked state machine that requires the
//!   frontend to invoke `tick()` once per second while running
//! - **Exercise Rotation**: sequential-with-wraparound or uniform-random
//!   selection from a newline-delimited exercise list
//! - **Storage**: SQLite-backed key-value store for settings and a
//!   completion history table
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: the countdown state machine
//! - [`Settings`]: duration, exercise list text and rotation mode
//! - [`Database`]: settings persistence and completion history
//! - [`AlarmNotifier`]: trait for the looping alarm device

pub mod alarm;
pub mod error;
pub mod events;
pub mod exercises;
pub mod settings;
pub mod storage;
pub mod timer;

pub use alarm::{AlarmNotifier, NullAlarm};
pub use error::{CoreError, StorageError};
pub use events::Event;
pub use exercises::parse_exercise_list;
pub use settings::{RotationMode, Settings};
pub use storage::{Database, KvStore, MemoryStore};
pub use timer::{format_time, TimerEngine, TimerState};
