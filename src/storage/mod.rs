//! Best-effort persistence of editor state
//!
//! The state is written as one JSON document under a single key. Writes that
//! would exceed the size cap degrade to a minimal state (truncated raw text,
//! no history) instead of failing. Every failure here is reported to the
//! caller as a [`StorageError`]; callers log it and carry on.
//!
//! | Key                    | Content                      |
//! |------------------------|------------------------------|
//! | `<storage key>`        | [`PersistedState`]           |
//! | `<storage key>-backup` | copy taken when a crash is recorded |
//! | `editor-error-state`   | [`CrashRecord`]              |

#[cfg(target_arch = "wasm32")]
pub mod local;
pub mod memory;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::errors::StorageError;
use crate::undo::HistoryStack;
use crate::utils::{Clock, SystemClock};

pub const CURRENT_VERSION: &str = "1.0.0";
pub const CRASH_RECORD_KEY: &str = "editor-error-state";
const AVAILABILITY_KEY: &str = "__phrase_editor_test__";

/// Key/value store with the shape of the browser's `localStorage`
pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
    fn clear(&mut self) -> Result<(), StorageError>;

    /// Whether a write/remove round trip succeeds
    fn is_available(&mut self) -> bool {
        self.set_item(AVAILABILITY_KEY, AVAILABILITY_KEY).is_ok() && self.remove_item(AVAILABILITY_KEY).is_ok()
    }
}

impl<S: StorageBackend + ?Sized> StorageBackend for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        (**self).clear()
    }

    fn is_available(&mut self) -> bool {
        (**self).is_available()
    }
}

/// Serialized editor state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub raw_text: String,
    pub processed_text: String,
    pub history: Vec<String>,
    pub history_index: usize,
    pub timestamp: i64,
    pub version: String,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            raw_text: String::new(),
            processed_text: String::new(),
            history: vec![String::new()],
            history_index: 0,
            timestamp: 0,
            version: CURRENT_VERSION.to_string(),
        }
    }
}

impl PersistedState {
    pub fn new(raw_text: impl Into<String>, processed_text: impl Into<String>, history: &HistoryStack) -> Self {
        Self {
            raw_text: raw_text.into(),
            processed_text: processed_text.into(),
            history: history.entries().map(str::to_string).collect(),
            history_index: history.current_index(),
            ..Default::default()
        }
    }

    /// Rebuild the history stack, repairing an out-of-range index
    pub fn history_stack(&self, max_entries: usize) -> HistoryStack {
        HistoryStack::from_parts(self.history.clone(), self.history_index, max_entries)
    }
}

/// How a save was carried out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The full state was over the cap; a minimal state was written instead
    Truncated,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub has_data: bool,
    pub timestamp: Option<i64>,
    /// Length in bytes of the stored document
    pub size: usize,
}

/// Minimal diagnostics kept after an unrecoverable error
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashRecord {
    pub error: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Saves and restores [`PersistedState`] through a [`StorageBackend`]
pub struct StateStore<B: StorageBackend, C: Clock = SystemClock> {
    backend: B,
    clock: C,
    key: String,
    max_bytes: usize,
    truncated_raw_text_chars: usize,
}

impl<B: StorageBackend> StateStore<B, SystemClock> {
    pub fn new(backend: B, config: &EditorConfig) -> Self {
        Self::with_clock(backend, config, SystemClock)
    }
}

impl<B: StorageBackend, C: Clock> StateStore<B, C> {
    pub fn with_clock(backend: B, config: &EditorConfig, clock: C) -> Self {
        Self {
            backend,
            clock,
            key: config.storage_key.clone(),
            max_bytes: config.storage_max_bytes,
            truncated_raw_text_chars: config.truncated_raw_text_chars,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn backup_key(&self) -> String {
        format!("{}-backup", self.key)
    }

    /// Write `state`, stamping the current time and version
    pub fn save(&mut self, state: &PersistedState) -> Result<SaveOutcome, StorageError> {
        if !self.backend.is_available() {
            return Err(StorageError::Unavailable);
        }

        let mut state = state.clone();
        state.timestamp = self.clock.now_ms();
        state.version = CURRENT_VERSION.to_string();

        let json = to_json(&state)?;
        if json.len() <= self.max_bytes {
            self.backend.set_item(&self.key, &json)?;
            return Ok(SaveOutcome::Saved);
        }

        log::warn!("State too large for storage: {} bytes", json.len());
        let minimal = PersistedState {
            raw_text: state.raw_text.chars().take(self.truncated_raw_text_chars).collect(),
            timestamp: state.timestamp,
            ..Default::default()
        };
        self.backend.set_item(&self.key, &to_json(&minimal)?)?;
        Ok(SaveOutcome::Truncated)
    }

    /// Read the saved state; unreadable data counts as none
    pub fn load(&self) -> Option<PersistedState> {
        let data = match self.backend.get_item(&self.key) {
            Ok(Some(data)) => data,
            Ok(None) => return None,
            Err(e) => {
                log::error!("Failed to load state: {}", e);
                return None;
            }
        };

        let mut state: PersistedState = match serde_json::from_str(&data) {
            Ok(state) => state,
            Err(e) => {
                log::error!("Failed to load state: {}", e);
                return None;
            }
        };

        if state.version != CURRENT_VERSION {
            log::info!("Migrating saved state from version {} to {}", state.version, CURRENT_VERSION);
            state.version = CURRENT_VERSION.to_string();
        }

        Some(state)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.backend.remove_item(&self.key)
    }

    pub fn info(&self) -> StorageInfo {
        let Ok(Some(data)) = self.backend.get_item(&self.key) else {
            return StorageInfo::default();
        };

        match serde_json::from_str::<PersistedState>(&data) {
            Ok(state) => StorageInfo {
                has_data: true,
                timestamp: Some(state.timestamp),
                size: data.len(),
            },
            Err(_) => StorageInfo::default(),
        }
    }

    /// Store a crash record and back up the saved state next to it
    pub fn record_crash(&mut self, message: &str, user_agent: Option<String>) -> Result<(), StorageError> {
        let record = CrashRecord {
            error: message.to_string(),
            timestamp: self.clock.now_ms(),
            user_agent,
        };
        self.backend.set_item(CRASH_RECORD_KEY, &to_json(&record)?)?;

        if let Some(saved) = self.backend.get_item(&self.key)? {
            let backup_key = self.backup_key();
            self.backend.set_item(&backup_key, &saved)?;
        }
        Ok(())
    }

    pub fn last_crash(&self) -> Option<CrashRecord> {
        let data = self.backend.get_item(CRASH_RECORD_KEY).ok().flatten()?;
        serde_json::from_str(&data).ok()
    }

    /// State saved by the last [`record_crash`](Self::record_crash)
    pub fn load_backup(&self) -> Option<PersistedState> {
        let data = self.backend.get_item(&self.backup_key()).ok().flatten()?;
        serde_json::from_str(&data).ok()
    }

    /// Wipe everything in the backend
    pub fn reset_data(&mut self) -> Result<(), StorageError> {
        self.backend.clear()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ManualClock;

    fn store(config: &EditorConfig) -> StateStore<MemoryStorage, ManualClock> {
        StateStore::with_clock(MemoryStorage::new(), config, ManualClock::at(42))
    }

    fn sample_history() -> HistoryStack {
        let mut history = HistoryStack::default();
        history.reset("b\na");
        history.push("a\nb");
        history
    }

    #[test]
    fn test_save_then_load() {
        let config = EditorConfig::default();
        let mut store = store(&config);
        let state = PersistedState::new("b\na", "a\nb", &sample_history());

        assert_eq!(store.save(&state).unwrap(), SaveOutcome::Saved);

        let loaded = store.load().unwrap();
        assert_eq!(loaded.raw_text, "b\na");
        assert_eq!(loaded.history, vec!["b\na", "a\nb"]);
        assert_eq!(loaded.history_index, 1);
        assert_eq!(loaded.timestamp, 42);
        assert_eq!(loaded.version, CURRENT_VERSION);
    }

    #[test]
    fn test_oversized_state_degrades_to_minimal() {
        let config = EditorConfig {
            storage_max_bytes: 200,
            truncated_raw_text_chars: 10,
            ..Default::default()
        };
        let mut store = store(&config);
        let big = "x".repeat(500);
        let state = PersistedState::new(big.clone(), big, &HistoryStack::default());

        assert_eq!(store.save(&state).unwrap(), SaveOutcome::Truncated);

        let loaded = store.load().unwrap();
        assert_eq!(loaded.raw_text, "x".repeat(10));
        assert_eq!(loaded.processed_text, "");
        assert_eq!(loaded.history, vec![String::new()]);
        assert_eq!(loaded.history_index, 0);
    }

    #[test]
    fn test_old_version_is_migrated_on_load() {
        let config = EditorConfig::default();
        let mut store = store(&config);
        store
            .backend_mut()
            .set_item(&config.storage_key, r#"{"rawText":"a","version":"0.9.0"}"#)
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.version, CURRENT_VERSION);
        assert_eq!(loaded.raw_text, "a");
        assert_eq!(loaded.history, vec![String::new()]);
    }

    #[test]
    fn test_corrupt_data_loads_as_none() {
        let config = EditorConfig::default();
        let mut store = store(&config);
        store.backend_mut().set_item(&config.storage_key, "{not json").unwrap();

        assert_eq!(store.load(), None);
        assert_eq!(store.info(), StorageInfo::default());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let config = EditorConfig::default();
        let mut store = StateStore::with_clock(MemoryStorage::with_quota(8), &config, ManualClock::at(0));
        let state = PersistedState::new("some text", "", &HistoryStack::default());

        assert!(matches!(store.save(&state), Err(StorageError::Unavailable) | Err(StorageError::WriteFailure(_))));
    }

    #[test]
    fn test_info_reports_timestamp_and_size() {
        let config = EditorConfig::default();
        let mut store = store(&config);
        assert!(!store.info().has_data);

        store.save(&PersistedState::default()).unwrap();
        let info = store.info();
        assert!(info.has_data);
        assert_eq!(info.timestamp, Some(42));
        assert!(info.size > 0);
    }

    #[test]
    fn test_crash_record_backs_up_state() {
        let config = EditorConfig::default();
        let mut store = store(&config);
        store.save(&PersistedState::new("keep me", "", &HistoryStack::default())).unwrap();

        store.record_crash("render failed", Some("test-agent".into())).unwrap();

        let record = store.last_crash().unwrap();
        assert_eq!(record.error, "render failed");
        assert_eq!(record.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(store.load_backup().unwrap().raw_text, "keep me");

        store.reset_data().unwrap();
        assert_eq!(store.load(), None);
        assert_eq!(store.last_crash(), None);
    }

    #[test]
    fn test_history_stack_repairs_bad_index() {
        let state = PersistedState {
            history: vec!["a".into(), "b".into()],
            history_index: 7,
            ..Default::default()
        };
        assert_eq!(state.history_stack(100).current(), "b");
    }
}
