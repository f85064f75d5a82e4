//! Engagement Meter - A state-managed HTTP server that measures reader engagement
//!
//! Combines scroll depth with reading-time milestones and sends an engagement
//! event once both the scroll and the time condition of a milestone hold.

pub mod api;
pub mod config;
pub mod engagement;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::{Config, TrackerSettings};
pub use engagement::EngagementTracker;
pub use error::EngagementError;
pub use state::AppState;
pub use utils::signals::shutdown_signal;
