//! Idle page view reaper background task

use std::{sync::Arc, time::Duration};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// How often idle page views are swept
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Background task that forgets page views idle for longer than the configured TTL
pub async fn page_view_reaper_task(state: Arc<AppState>) {
    info!(
        "Starting page view reaper task (ttl {}s)",
        state.settings.page_view_ttl.as_secs()
    );

    let mut interval = interval(SWEEP_INTERVAL);

    loop {
        interval.tick().await;

        match state.reap_idle_page_views() {
            Ok(0) => debug!("No idle page views"),
            Ok(reaped) => info!("Reaped {} idle page view(s)", reaped),
            Err(e) => warn!("Failed to reap idle page views: {}", e),
        }
    }
}
