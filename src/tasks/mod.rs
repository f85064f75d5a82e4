//! Background tasks module
//!
//! This module contains the milestone timers and the tasks that run
//! alongside the HTTP server.

pub mod milestone;
pub mod page_view_reaper;
pub mod timer;

// Re-export main items
pub use milestone::schedule_milestone;
pub use page_view_reaper::page_view_reaper_task;
pub use timer::{Timer, TimerHandle};
