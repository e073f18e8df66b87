//! Models module for the phrase editor
//!
//! Plain data shared by the registry, the execution engine and the UI, plus
//! the editor state container.

pub mod editor_state;
pub mod metrics;
pub mod operations;

// Re-export commonly used types
pub use editor_state::*;
pub use metrics::*;
pub use operations::*;
