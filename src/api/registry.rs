//! Stateless helpers exposed to JavaScript
//!
//! The operation catalogue for building menus, plus direct access to the
//! transforms and the analyzer for callers that don't need a worker.

use wasm_bindgen::prelude::*;

use crate::analysis::{analyze, format_execution_time, format_number};
use crate::api::helpers::{js_error, serialize};
use crate::transforms::{self, OperationInfo};

/// Every registered operation, in menu order
#[wasm_bindgen(js_name = listOperations)]
pub fn list_operations() -> Result<JsValue, JsValue> {
    let infos: Vec<OperationInfo> = transforms::list_operations()
        .iter()
        .map(|descriptor| descriptor.info())
        .collect();
    serialize(&infos, "Failed to serialize operations")
}

/// Apply one operation synchronously on the calling thread
#[wasm_bindgen(js_name = applyTransform)]
pub fn apply_transform(operation: &str, text: &str) -> Result<String, JsValue> {
    transforms::apply(operation, text).map_err(js_error)
}

#[wasm_bindgen(js_name = analyzeText)]
pub fn analyze_text(text: &str) -> Result<JsValue, JsValue> {
    serialize(&analyze(text), "Failed to serialize text metrics")
}

#[wasm_bindgen(js_name = formatExecutionTime)]
pub fn format_execution_time_js(ms: Option<f64>) -> String {
    format_execution_time(ms)
}

#[wasm_bindgen(js_name = formatNumber)]
pub fn format_number_js(n: f64) -> String {
    if !n.is_finite() || n < 0.0 {
        return "0".to_string();
    }
    format_number(n as usize)
}
