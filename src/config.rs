//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;
use serde::Serialize;

use crate::{
    engagement::{Milestones, DEFAULT_WORDS_PER_MINUTE},
    error::Result,
};

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "engagement-meter")]
#[command(about = "A state-managed HTTP server that measures reader engagement")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Reading speed used for the reading-time estimate
    #[arg(short, long, default_value_t = DEFAULT_WORDS_PER_MINUTE)]
    pub words_per_minute: u32,

    /// Scroll percentage of the medium milestone
    #[arg(long, default_value = "40")]
    pub medium_milestone: u32,

    /// Scroll percentage of the full milestone
    #[arg(long, default_value = "70")]
    pub full_milestone: u32,

    /// CSS selector of the article container on the host page
    #[arg(long, default_value = "article")]
    pub article_selector: String,

    /// CSS selector of the header container on the host page
    #[arg(long, default_value = "header")]
    pub header_selector: String,

    /// Feature name reported in error sources
    #[arg(long, default_value = "Engagement measurement")]
    pub feature_label: String,

    /// Minutes a page view may stay idle before it is forgotten
    #[arg(long, default_value = "30")]
    pub page_view_ttl: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Validate the tracking options
    pub fn tracker_settings(&self) -> Result<TrackerSettings> {
        Ok(TrackerSettings {
            words_per_minute: self.words_per_minute,
            milestones: Milestones::new(self.medium_milestone, self.full_milestone)?,
            article_selector: self.article_selector.clone(),
            header_selector: self.header_selector.clone(),
            feature_label: self.feature_label.clone(),
            page_view_ttl: Duration::from_secs(self.page_view_ttl * 60),
        })
    }
}

/// Validated options shared by every page view
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSettings {
    pub words_per_minute: u32,
    pub milestones: Milestones,
    pub article_selector: String,
    pub header_selector: String,
    pub feature_label: String,
    #[serde(skip)]
    pub page_view_ttl: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            milestones: Milestones::default(),
            article_selector: "article".to_string(),
            header_selector: "header".to_string(),
            feature_label: "Engagement measurement".to_string(),
            page_view_ttl: Duration::from_secs(30 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tracker_settings() {
        let config = Config::try_parse_from(["engagement-meter"]).unwrap();
        assert_eq!(config.address(), "0.0.0.0:20554");
        assert_eq!(config.log_level(), "info");

        let settings = config.tracker_settings().unwrap();
        let defaults = TrackerSettings::default();
        assert_eq!(settings.words_per_minute, defaults.words_per_minute);
        assert_eq!(settings.milestones, defaults.milestones);
        assert_eq!(settings.page_view_ttl, defaults.page_view_ttl);
    }

    #[test]
    fn rejects_inverted_milestones() {
        let config = Config::try_parse_from([
            "engagement-meter",
            "--medium-milestone",
            "80",
            "--full-milestone",
            "60",
        ])
        .unwrap();
        assert!(config.tracker_settings().is_err());
    }
}
