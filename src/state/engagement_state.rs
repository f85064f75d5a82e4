//! Engagement state structure exposed for host inspection

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{engagement::Milestone, services::EngagementEvent};

/// Per-page-view engagement flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementState {
    /// Time condition for the medium milestone (quarter of the reading time elapsed)
    pub medium_engagement: bool,
    /// Time condition for the full milestone (half of the reading time elapsed)
    pub full_engagement: bool,
    /// Scroll condition for the medium milestone
    pub first_scroll: bool,
    /// Scroll condition for the full milestone
    pub second_scroll: bool,
    /// Scroll threshold -> 1 once its band has been entered, 0 before
    pub scroll_tracker: BTreeMap<u32, u8>,
    /// Most recent scroll percentage reported
    pub last_percent: Option<u32>,
    /// Events sent to the analytics sink, in order
    pub events: Vec<EngagementEvent>,
}

impl EngagementState {
    /// Create a state with every flag cleared and one latch per threshold
    pub fn new(thresholds: impl IntoIterator<Item = u32>) -> Self {
        Self {
            medium_engagement: false,
            full_engagement: false,
            first_scroll: false,
            second_scroll: false,
            scroll_tracker: thresholds.into_iter().map(|t| (t, 0)).collect(),
            last_percent: None,
            events: Vec::new(),
        }
    }

    pub fn time_flag(&self, milestone: Milestone) -> bool {
        match milestone {
            Milestone::Medium => self.medium_engagement,
            Milestone::Full => self.full_engagement,
        }
    }

    pub fn set_time_flag(&mut self, milestone: Milestone, value: bool) {
        match milestone {
            Milestone::Medium => self.medium_engagement = value,
            Milestone::Full => self.full_engagement = value,
        }
    }

    pub fn scroll_flag(&self, milestone: Milestone) -> bool {
        match milestone {
            Milestone::Medium => self.first_scroll,
            Milestone::Full => self.second_scroll,
        }
    }

    pub fn set_scroll_flag(&mut self, milestone: Milestone) {
        match milestone {
            Milestone::Medium => self.first_scroll = true,
            Milestone::Full => self.second_scroll = true,
        }
    }

    /// Both conditions of a milestone hold
    pub fn ready(&self, milestone: Milestone) -> bool {
        self.time_flag(milestone) && self.scroll_flag(milestone)
    }
}
