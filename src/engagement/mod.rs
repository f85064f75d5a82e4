//! Engagement measurement core
//!
//! Reading-time estimation, scroll depth and the dual-condition tracker.

pub mod reading_time;
pub mod scroll;
pub mod tracker;

pub use reading_time::{
    article_text, reading_time, ReadingTimeEstimate, ReadingTimeOptions, DEFAULT_WORDS_PER_MINUTE,
};
pub use scroll::{Milestone, Milestones, ScrollMetrics};
pub use tracker::EngagementTracker;
