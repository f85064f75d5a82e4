//! Scroll depth measurement and milestone bands

use serde::{Deserialize, Serialize};

use crate::error::{EngagementError, Result};

/// Scroll position reported by the host page, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    /// Distance from the top of the document to the top of the viewport
    pub scroll_top: f64,
    pub viewport_height: f64,
    /// Full scroll height of the article container
    pub article_height: f64,
    /// Full scroll height of the header container, `None` when it was not found
    pub header_height: Option<f64>,
}

impl ScrollMetrics {
    /// Rounded percentage of the header plus article that has been scrolled into view.
    ///
    /// Returns `Ok(None)` when the content has no height. Overscroll (a negative
    /// `scroll_top`) is taken as reported and yields a low percentage.
    pub fn percent_scrolled(&self, header_selector: &str) -> Result<Option<u32>> {
        let header_height = self.header_height.ok_or_else(|| EngagementError::MissingHeader {
            selector: header_selector.to_string(),
        })?;

        for (name, value) in [
            ("scroll_top", self.scroll_top),
            ("viewport_height", self.viewport_height),
            ("article_height", self.article_height),
            ("header_height", header_height),
        ] {
            if !value.is_finite() {
                return Err(EngagementError::InvalidMeasurement(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
        }

        let content_height = self.article_height + header_height;
        if content_height <= 0.0 {
            return Ok(None);
        }

        let bottom = self.scroll_top + self.viewport_height;
        Ok(Some((bottom / content_height * 100.0).round().max(0.0) as u32))
    }
}

/// A named scroll-depth threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Milestone {
    Medium,
    Full,
}

impl Milestone {
    pub const ALL: [Milestone; 2] = [Milestone::Medium, Milestone::Full];

    /// Fraction of the estimated reading time after which the time condition holds
    pub fn time_divisor(self) -> f64 {
        match self {
            Milestone::Medium => 4.0,
            Milestone::Full => 2.0,
        }
    }

    /// Share of the reading time, as a percentage, quoted in event labels
    pub fn time_percent(self) -> u32 {
        match self {
            Milestone::Medium => 25,
            Milestone::Full => 50,
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            Milestone::Medium => "Medium engagement",
            Milestone::Full => "Full engagement",
        }
    }
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Milestone::Medium => write!(f, "medium"),
            Milestone::Full => write!(f, "full"),
        }
    }
}

/// Scroll thresholds in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestones {
    pub medium: u32,
    pub full: u32,
}

impl Milestones {
    pub fn new(medium: u32, full: u32) -> Result<Self> {
        if medium >= full {
            return Err(EngagementError::InvalidMilestones { medium, full });
        }
        Ok(Self { medium, full })
    }

    pub fn threshold(&self, milestone: Milestone) -> u32 {
        match milestone {
            Milestone::Medium => self.medium,
            Milestone::Full => self.full,
        }
    }

    /// Band a percentage falls in: `[medium, full)` or `[full, ∞)`
    pub fn band(&self, percent: u32) -> Option<Milestone> {
        if percent >= self.medium && percent < self.full {
            Some(Milestone::Medium)
        } else if percent >= self.full {
            Some(Milestone::Full)
        } else {
            None
        }
    }
}

impl Default for Milestones {
    fn default() -> Self {
        Self { medium: 40, full: 70 }
    }
}
