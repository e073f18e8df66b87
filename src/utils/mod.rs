//! Utility modules for the phrase editor
//!
//! This module contains timing helpers shared by the cache, the execution
//! engine and the autosave path.

pub mod performance;
pub mod schedule;

// Re-export commonly used types
pub use performance::*;
pub use schedule::*;
