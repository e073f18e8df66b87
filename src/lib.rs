//! Phrase Editor WASM Module
//!
//! Line-oriented editing of phrase lists: a registry of text transforms,
//! off-thread batched execution with progress, undo/redo history, a result
//! cache and best-effort persistence.
//!
//! The native modules are usable on their own (see [`PhraseEditor`] with a
//! [`ThreadWorker`](engine::ThreadWorker)); [`api`] wraps them for the browser.

pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod editor;
pub mod engine;
pub mod errors;
pub mod io;
pub mod models;
pub mod storage;
pub mod transforms;
pub mod undo;
pub mod utils;

// Re-export commonly used types
pub use config::EditorConfig;
pub use editor::{Dispatch, EditorUpdate, PhraseEditor};
pub use errors::{EditorError, EngineError, ImportError, StorageError, TransformError};
pub use models::{EditorStore, OperationId, OperationIdentifier, OperationMetrics, TextMetrics};
pub use transforms::SearchReplaceOptions;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        wasm_warn!("Logger already initialized: {}", e);
    }

    log::info!("Phrase editor WASM module initialized");
}
