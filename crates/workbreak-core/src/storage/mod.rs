//! Settings store and completion history.

mod database;

pub use database::{CompletionRecord, Database};

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::StorageError;

/// Synchronous string key-value store for settings.
///
/// The engine writes every settings change through immediately and reads
/// each key once at startup.
pub trait KvStore {
    /// Get a value, or `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Set a value, overwriting any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and ephemeral runs.
///
/// Clones share the same underlying map, so a test can keep a handle and
/// observe writes made through an engine-owned clone.
#[derive(Clone, Default)]
pub struct MemoryStore {
    map: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Returns `~/.config/workbreak[-dev]/` based on WORKBREAK_ENV.
///
/// Set WORKBREAK_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("WORKBREAK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("workbreak-dev")
    } else {
        base_dir.join("workbreak")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
