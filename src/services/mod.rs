//! External service integration module
//!
//! This module contains the analytics sinks engagement events are sent to.

pub mod analytics;

// Re-export main types
pub use analytics::*;
