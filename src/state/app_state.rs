//! Main application state management

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{PageView, PageViewInit, PageViewSnapshot};
use crate::{
    config::TrackerSettings,
    engagement::ScrollMetrics,
    error::{EngagementError, Result},
    services::AnalyticsSink,
};

/// Main application state: every live page view plus shared settings
pub struct AppState {
    /// Options applied to new page views
    pub settings: TrackerSettings,
    /// Destination for engagement events
    pub sink: Arc<dyn AnalyticsSink>,
    /// Live page views by id
    pub page_views: Mutex<HashMap<u64, PageView>>,
    next_id: AtomicU64,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(
        settings: TrackerSettings,
        sink: Arc<dyn AnalyticsSink>,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            settings,
            sink,
            page_views: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Register a page view and start its milestone timers
    pub fn start_page_view(&self, init: PageViewInit) -> Result<PageViewSnapshot> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let page_view = PageView::start(id, init, &self.settings, Arc::clone(&self.sink));
        let snapshot = page_view.snapshot()?;

        self.lock_page_views()?.insert(id, page_view);
        self.record_action("pageview");
        Ok(snapshot)
    }

    /// Feed a scroll measurement to a page view; `None` if it is unknown
    pub fn scroll_page_view(&self, id: u64, metrics: &ScrollMetrics) -> Result<Option<PageViewSnapshot>> {
        let page_views = self.lock_page_views()?;
        let Some(page_view) = page_views.get(&id) else {
            return Ok(None);
        };
        let snapshot = page_view.scroll(metrics)?;
        drop(page_views);

        self.record_action("scroll");
        Ok(Some(snapshot))
    }

    pub fn get_page_view(&self, id: u64) -> Result<Option<PageViewSnapshot>> {
        self.lock_page_views()?
            .get(&id)
            .map(PageView::snapshot)
            .transpose()
    }

    /// Stop a page view's timers and forget it
    pub fn close_page_view(&self, id: u64) -> Result<Option<PageViewSnapshot>> {
        let Some(page_view) = self.lock_page_views()?.remove(&id) else {
            return Ok(None);
        };
        page_view.close();
        self.record_action("close");
        page_view.snapshot().map(Some)
    }

    /// Close every page view, returning how many there were
    pub fn close_all(&self) -> Result<usize> {
        let drained: Vec<PageView> = self.lock_page_views()?.drain().map(|(_, pv)| pv).collect();
        for page_view in &drained {
            page_view.close();
        }
        Ok(drained.len())
    }

    /// Close page views idle for longer than the configured TTL
    pub fn reap_idle_page_views(&self) -> Result<usize> {
        let ttl = chrono::Duration::from_std(self.settings.page_view_ttl)
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.reap_idle_before(Utc::now() - ttl)
    }

    /// Close page views whose last activity is older than `cutoff`
    pub fn reap_idle_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut page_views = self.lock_page_views()?;
        let mut idle = Vec::new();
        for (id, page_view) in page_views.iter() {
            if page_view.last_activity()? < cutoff {
                idle.push(*id);
            }
        }

        for id in &idle {
            if let Some(page_view) = page_views.remove(id) {
                debug!("Reaping idle page view {} ({})", id, page_view.url);
                page_view.close();
            }
        }
        Ok(idle.len())
    }

    pub fn active_page_views(&self) -> usize {
        self.page_views.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    fn lock_page_views(&self) -> Result<MutexGuard<'_, HashMap<u64, PageView>>> {
        self.page_views
            .lock()
            .map_err(|_| EngagementError::LockPoisoned("page view registry"))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("active_page_views", &self.active_page_views())
            .field("port", &self.port)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        if let Ok(count) = self.close_all() {
            if count > 0 {
                info!("Closed {} page view(s) on shutdown", count);
            }
        }
    }
}
