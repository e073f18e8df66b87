//! Editor configuration
//!
//! Limits and tuning knobs, deserialized from a JS object or JSON string.
//! Every field is optional; omitted fields take the defaults below.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

const MIB: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Lines per progress batch for per-line operations
    pub batch_size: usize,
    /// Largest accepted upload, in bytes
    pub max_file_size: usize,
    /// Largest accepted text, in bytes
    pub max_text_size: usize,
    /// Snapshots kept by the undo history
    pub history_limit: usize,
    pub cache_enabled: bool,
    /// Total byte budget of the operation cache
    pub cache_max_bytes: usize,
    /// Age after which a cache entry is treated as missing
    pub cache_max_age_ms: i64,
    /// Largest serialized state written to local storage
    pub storage_max_bytes: usize,
    pub storage_key: String,
    /// Minimum spacing between autosaves
    pub autosave_interval_ms: i64,
    /// Raw text kept when the saved state must be truncated
    pub truncated_raw_text_chars: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_file_size: 10 * MIB,
            max_text_size: 10 * MIB,
            history_limit: crate::undo::DEFAULT_MAX_ENTRIES,
            cache_enabled: true,
            cache_max_bytes: 50 * MIB,
            cache_max_age_ms: 24 * 60 * 60 * 1000,
            storage_max_bytes: 5 * MIB,
            storage_key: "phrase-editor-state".to_string(),
            autosave_interval_ms: 1000,
            truncated_raw_text_chars: 100_000,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("batchSize", self.batch_size),
            ("maxFileSize", self.max_file_size),
            ("maxTextSize", self.max_text_size),
            ("historyLimit", self.history_limit),
            ("cacheMaxBytes", self.cache_max_bytes),
            ("storageMaxBytes", self.storage_max_bytes),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if self.cache_max_age_ms <= 0 {
            return Err(ConfigError::OutOfRange {
                field: "cacheMaxAgeMs",
                reason: format!("must be positive (got {})", self.cache_max_age_ms),
            });
        }
        if self.autosave_interval_ms < 0 {
            return Err(ConfigError::OutOfRange {
                field: "autosaveIntervalMs",
                reason: format!("must not be negative (got {})", self.autosave_interval_ms),
            });
        }
        if self.storage_key.is_empty() {
            return Err(ConfigError::OutOfRange {
                field: "storageKey",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
