//! Metrics reported to the UI
//!
//! Both structs cross the JS boundary with camelCase field names.

use serde::{Deserialize, Serialize};

use super::operations::OperationIdentifier;

/// Descriptive counts for a block of text, recomputed on every edit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMetrics {
    pub total_lines: usize,
    pub non_empty_lines: usize,
    pub empty_lines: usize,
    pub total_characters: usize,
    pub word_count: usize,
}

/// Result summary of the most recent completed operation.
///
/// Replaced, never accumulated, each time an operation finishes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMetrics {
    pub operation: OperationIdentifier,
    pub execution_time_ms: f64,
    pub lines_processed: usize,
    pub lines_changed: usize,
}
