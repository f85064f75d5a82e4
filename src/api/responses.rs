//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{config::TrackerSettings, engagement::Milestones};

/// Server status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub active_page_views: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Options the host page snippet needs to take its measurements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub article_selector: String,
    pub header_selector: String,
    pub words_per_minute: u32,
    pub milestones: Milestones,
}

impl From<&TrackerSettings> for ConfigResponse {
    fn from(settings: &TrackerSettings) -> Self {
        Self {
            article_selector: settings.article_selector.clone(),
            header_selector: settings.header_selector.clone(),
            words_per_minute: settings.words_per_minute,
            milestones: settings.milestones,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
