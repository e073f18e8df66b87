//! Shared types for the WASM API
//!
//! Read-only views handed to JavaScript after each call.

use serde::Serialize;

use crate::models::{EditorStore, OperationMetrics, TextMetrics};

/// Everything the UI renders from, in one object
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub raw_text: String,
    pub processed_text: String,
    pub text_metrics: TextMetrics,
    pub operation_metrics: Option<OperationMetrics>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub history_index: usize,
    pub history_length: usize,
    pub is_processing: bool,
    pub last_operation_timestamp: i64,
}

impl From<&EditorStore> for EditorView {
    fn from(store: &EditorStore) -> Self {
        Self {
            raw_text: store.raw_text().to_string(),
            processed_text: store.processed_text().to_string(),
            text_metrics: store.text_metrics(),
            operation_metrics: store.operation_metrics().cloned(),
            can_undo: store.can_undo(),
            can_redo: store.can_redo(),
            history_index: store.history().current_index(),
            history_length: store.history().len(),
            is_processing: store.is_processing(),
            last_operation_timestamp: store.last_operation_timestamp(),
        }
    }
}

/// Progress of the in-flight operation
#[derive(Serialize, Clone, Copy, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub is_busy: bool,
    pub progress: u8,
    pub processed_items: usize,
    pub operation_type: Option<&'static str>,
}
