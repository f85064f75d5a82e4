//! Analytics sinks that receive engagement events

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{EngagementError, Result};

/// Category shared by every engagement event
pub const EVENT_CATEGORY: &str = "Content engagement";

/// Structured event submitted to the analytics sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub event_action: String,
    pub event_category: String,
    pub event_label: String,
}

/// Destination for engagement events and debug output.
///
/// Implementations stand in for the host's tag-management client.
pub trait AnalyticsSink: Send + Sync {
    /// Submit a structured engagement event
    fn link(&self, event: &EngagementEvent) -> Result<()>;

    /// Submit a debug record, either a string or an object
    fn debug(&self, payload: &Value);
}

/// Sink that writes events to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn link(&self, event: &EngagementEvent) -> Result<()> {
        info!(
            event_action = %event.event_action,
            event_category = %event.event_category,
            event_label = %event.event_label,
            "Engagement event"
        );
        Ok(())
    }

    fn debug(&self, payload: &Value) {
        match payload {
            Value::String(message) => debug!("{}", message),
            other => debug!(payload = %other, "Engagement debug"),
        }
    }
}

/// Sink that keeps everything it receives in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<EngagementEvent>>,
    debug_log: Mutex<Vec<Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in submission order
    pub fn events(&self) -> Vec<EngagementEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn debug_log(&self) -> Vec<Value> {
        self.debug_log.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl AnalyticsSink for MemorySink {
    fn link(&self, event: &EngagementEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| EngagementError::LockPoisoned("memory sink"))?
            .push(event.clone());
        Ok(())
    }

    fn debug(&self, payload: &Value) {
        if let Ok(mut log) = self.debug_log.lock() {
            log.push(payload.clone());
        }
    }
}
