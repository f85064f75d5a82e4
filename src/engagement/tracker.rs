//! Engagement tracking state machine
//!
//! An engagement event fires only when both the scroll condition and the
//! time condition of a milestone hold. Scroll latches never reset; after a
//! send only the time flag is cleared, so each milestone fires at most once.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info};

use super::{
    reading_time::ReadingTimeEstimate,
    scroll::{Milestone, Milestones, ScrollMetrics},
};
use crate::{
    error::Result,
    services::{AnalyticsSink, EngagementEvent, EVENT_CATEGORY},
    state::EngagementState,
};

/// Tracks one page view's progress towards the engagement milestones
pub struct EngagementTracker {
    estimate: ReadingTimeEstimate,
    milestones: Milestones,
    header_selector: String,
    state: EngagementState,
    sink: Arc<dyn AnalyticsSink>,
}

impl EngagementTracker {
    pub fn new(
        estimate: ReadingTimeEstimate,
        milestones: Milestones,
        header_selector: impl Into<String>,
        sink: Arc<dyn AnalyticsSink>,
    ) -> Self {
        let state = EngagementState::new([milestones.medium, milestones.full]);
        Self {
            estimate,
            milestones,
            header_selector: header_selector.into(),
            state,
            sink,
        }
    }

    pub fn estimate(&self) -> &ReadingTimeEstimate {
        &self.estimate
    }

    pub fn milestones(&self) -> Milestones {
        self.milestones
    }

    /// Copy of the current flags
    pub fn snapshot(&self) -> EngagementState {
        self.state.clone()
    }

    /// Handle a scroll measurement, returning the computed percentage
    pub fn on_scroll(&mut self, metrics: &ScrollMetrics) -> Result<Option<u32>> {
        let Some(percent) = metrics.percent_scrolled(&self.header_selector)? else {
            debug!("Content has no height, ignoring scroll");
            return Ok(None);
        };

        self.state.last_percent = Some(percent);
        self.sink.debug(&json!(format!("Percent: {} %", percent)));

        let Some(milestone) = self.milestones.band(percent) else {
            return Ok(Some(percent));
        };

        let threshold = self.milestones.threshold(milestone);
        let latch = self.state.scroll_tracker.entry(threshold).or_insert(0);
        if *latch == 0 {
            *latch = 1;
            debug!("Scroll milestone {} reached at {}%", milestone, percent);
            self.state.set_scroll_flag(milestone);
            self.dispatch()?;
            self.sink.debug(&Value::String(format!("Scroll: {}", threshold)));
        }

        Ok(Some(percent))
    }

    /// Mark the time condition of a milestone as met and try to send
    pub fn on_time_reached(&mut self, milestone: Milestone) -> Result<()> {
        debug!("Time milestone {} reached", milestone);
        self.state.set_time_flag(milestone, true);
        self.dispatch()
    }

    /// Send every milestone whose time and scroll conditions both hold.
    ///
    /// Only the time flag is cleared afterwards.
    pub fn dispatch(&mut self) -> Result<()> {
        for milestone in Milestone::ALL {
            if self.state.ready(milestone) {
                let event = self.event_for(milestone);
                self.sink.link(&event)?;
                info!("{} sent: {}", event.event_action, event.event_label);
                self.state.events.push(event);
                self.state.set_time_flag(milestone, false);
            }
        }
        Ok(())
    }

    /// Build the event payload for a milestone
    pub fn event_for(&self, milestone: Milestone) -> EngagementEvent {
        EngagementEvent {
            event_action: milestone.action().to_string(),
            event_category: EVENT_CATEGORY.to_string(),
            event_label: format!(
                "{}% of page scrolled and {}% of an estimated {} min read",
                self.milestones.threshold(milestone),
                milestone.time_percent(),
                self.estimate.display_minutes(),
            ),
        }
    }
}

impl std::fmt::Debug for EngagementTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngagementTracker")
            .field("estimate", &self.estimate)
            .field("milestones", &self.milestones)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
