//! Page view lifecycle and the error boundary around its tracker

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::EngagementState;
use crate::{
    config::TrackerSettings,
    engagement::{
        article_text, reading_time, EngagementTracker, Milestone, ReadingTimeEstimate,
        ReadingTimeOptions, ScrollMetrics,
    },
    error::{EngagementError, Result},
    services::AnalyticsSink,
    tasks::{schedule_milestone, Timer, TimerHandle},
};

/// Page view registration sent by the host page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageViewInit {
    /// Location of the page being read
    pub url: String,
    /// Text content of each direct child of the article container,
    /// `None` when the container was not found
    #[serde(default)]
    pub article: Option<Vec<String>>,
}

/// Tracker plus the all-or-nothing error boundary wrapped around it.
///
/// The first failure disables all further handling, stops every milestone
/// timer of the page view and records an error source naming the feature
/// and the page.
#[derive(Debug)]
pub struct Session {
    url: String,
    feature_label: String,
    tracker: Option<EngagementTracker>,
    disabled: bool,
    error_source: Option<String>,
    last_activity: DateTime<Utc>,
    timers: Vec<TimerHandle>,
}

pub type SharedSession = Arc<Mutex<Session>>;

impl Session {
    fn new(url: String, feature_label: String) -> Self {
        Self {
            url,
            feature_label,
            tracker: None,
            disabled: false,
            error_source: None,
            last_activity: Utc::now(),
            timers: Vec::new(),
        }
    }

    /// Run `f` against the tracker unless the boundary has tripped.
    ///
    /// Errors are absorbed here; the caller only sees `None`.
    pub fn guard<T, F>(&mut self, action: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut EngagementTracker) -> Result<T>,
    {
        self.last_activity = Utc::now();
        if self.disabled {
            debug!("Ignoring {} for disabled page view {}", action, self.url);
            return None;
        }
        let tracker = self.tracker.as_mut()?;
        match f(tracker) {
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(action, &e);
                None
            }
        }
    }

    fn fail(&mut self, action: &str, error: &EngagementError) {
        let source = format!("{} ({})", self.feature_label, self.url);
        warn!("Engagement tracking disabled during {}: {} [{}]", action, error, source);
        self.disabled = true;
        self.error_source = Some(source);
        self.cancel_timers();
    }

    /// Hand the page view's timers to the boundary so a failure on any
    /// trigger path stops all of them
    fn attach_timers(&mut self, timers: impl IntoIterator<Item = TimerHandle>) {
        self.timers.extend(timers);
        if self.disabled {
            self.cancel_timers();
        }
    }

    fn cancel_timers(&self) {
        for timer in &self.timers {
            timer.cancel();
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn error_source(&self) -> Option<&str> {
        self.error_source.as_deref()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn tracker(&self) -> Option<&EngagementTracker> {
        self.tracker.as_ref()
    }
}

/// Serializable view of a page view for the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageViewSnapshot {
    pub id: u64,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub estimate: Option<ReadingTimeEstimate>,
    /// Rounded reading time for the host data layer, e.g. `"4 min"`
    pub reading_time: Option<String>,
    pub state: Option<EngagementState>,
    pub disabled: bool,
    pub error_source: Option<String>,
    pub active_timers: usize,
}

/// One tracked page view: the guarded tracker and its milestone timers
#[derive(Debug)]
pub struct PageView {
    pub id: u64,
    pub url: String,
    pub created_at: DateTime<Utc>,
    session: SharedSession,
    timers: Vec<Timer>,
}

impl PageView {
    /// Initialise tracking for a page view.
    ///
    /// Never fails: initialisation errors are recorded on the page view,
    /// which then stays disabled.
    pub fn start(
        id: u64,
        init: PageViewInit,
        settings: &TrackerSettings,
        sink: Arc<dyn AnalyticsSink>,
    ) -> Self {
        let mut session = Session::new(init.url.clone(), settings.feature_label.clone());

        match build_tracker(&init, settings, sink) {
            Ok(tracker) => session.tracker = Some(tracker),
            Err(e) => session.fail("initialization", &e),
        }

        let reading_ms = session.tracker().map(|tracker| {
            info!("Page view {} started: {} ({})", id, init.url, tracker.estimate().text);
            tracker.estimate().time_ms
        });

        let session = Arc::new(Mutex::new(session));
        let timers: Vec<Timer> = reading_ms
            .map(|time_ms| {
                Milestone::ALL
                    .into_iter()
                    .map(|m| schedule_milestone(&session, m, time_ms / m.time_divisor()))
                    .collect()
            })
            .unwrap_or_default();

        match session.lock() {
            Ok(mut session) => session.attach_timers(timers.iter().map(Timer::handle)),
            Err(e) => warn!("Failed to lock page view session: {}", e),
        }

        Self {
            id,
            url: init.url,
            created_at: Utc::now(),
            session,
            timers,
        }
    }

    /// Feed a scroll measurement through the error boundary
    pub fn scroll(&self, metrics: &ScrollMetrics) -> Result<PageViewSnapshot> {
        {
            let mut session = self.lock_session()?;
            if let Some(Some(percent)) = session.guard("scroll", |t| t.on_scroll(metrics)) {
                debug!("Page view {} scrolled to {}%", self.id, percent);
            }
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> Result<PageViewSnapshot> {
        let session = self.lock_session()?;
        let tracker = session.tracker();
        Ok(PageViewSnapshot {
            id: self.id,
            url: self.url.clone(),
            created_at: self.created_at,
            last_activity: session.last_activity(),
            estimate: tracker.map(|t| t.estimate().clone()),
            reading_time: tracker.map(|t| t.estimate().reading_time()),
            state: tracker.map(EngagementTracker::snapshot),
            disabled: session.is_disabled(),
            error_source: session.error_source().map(str::to_string),
            active_timers: self.timers.iter().filter(|t| !t.is_cancelled()).count(),
        })
    }

    pub fn last_activity(&self) -> Result<DateTime<Utc>> {
        Ok(self.lock_session()?.last_activity())
    }

    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    /// Stop both milestone timers
    pub fn close(&self) {
        self.cancel_timers();
        info!("Page view {} closed", self.id);
    }

    fn cancel_timers(&self) {
        for timer in &self.timers {
            timer.cancel();
        }
    }

    fn lock_session(&self) -> Result<std::sync::MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| EngagementError::LockPoisoned("page view session"))
    }
}

fn build_tracker(
    init: &PageViewInit,
    settings: &TrackerSettings,
    sink: Arc<dyn AnalyticsSink>,
) -> Result<EngagementTracker> {
    let children = init
        .article
        .as_ref()
        .ok_or_else(|| EngagementError::MissingArticle {
            selector: settings.article_selector.clone(),
        })?;

    let text = article_text(children);
    let estimate = reading_time(&text, &ReadingTimeOptions::new(settings.words_per_minute));
    sink.debug(&serde_json::to_value(&estimate).unwrap_or(Value::Null));

    Ok(EngagementTracker::new(
        estimate,
        settings.milestones,
        settings.header_selector.clone(),
        sink,
    ))
}
