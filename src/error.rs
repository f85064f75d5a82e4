//! Error types for engagement measurement

use thiserror::Error;

/// Failures that disable engagement tracking for a page view
#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("article container `{selector}` not found on page")]
    MissingArticle { selector: String },

    #[error("header container `{selector}` not found on page")]
    MissingHeader { selector: String },

    #[error("invalid scroll measurement: {0}")]
    InvalidMeasurement(String),

    #[error("analytics sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("invalid milestones: medium={medium}%, full={full}% (medium must be below full)")]
    InvalidMilestones { medium: u32, full: u32 },

    #[error("failed to lock {0}")]
    LockPoisoned(&'static str),
}

pub type Result<T> = std::result::Result<T, EngagementError>;
