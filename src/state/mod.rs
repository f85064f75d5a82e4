//! State management module
//!
//! This module contains the engagement state, the page view lifecycle and
//! the application-wide registry.

pub mod app_state;
pub mod engagement_state;
pub mod page_view;

// Re-export main types
pub use app_state::AppState;
pub use engagement_state::EngagementState;
pub use page_view::{PageView, PageViewInit, PageViewSnapshot, Session, SharedSession};
