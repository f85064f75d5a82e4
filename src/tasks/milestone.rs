//! Time-based milestone scheduling

use std::{sync::Arc, time::Duration};
use tracing::{error, info};

use super::timer::Timer;
use crate::{engagement::Milestone, state::SharedSession};

/// Schedule the time condition of `milestone` after `delay_ms` milliseconds.
///
/// The callback sets the time flag through the page view's error boundary,
/// which also attempts a dispatch, then cancels its own timer so it runs once.
pub fn schedule_milestone(session: &SharedSession, milestone: Milestone, delay_ms: f64) -> Timer {
    let delay = Duration::try_from_secs_f64(delay_ms / 1000.0).unwrap_or_default();
    let timer = Timer::new(Some(delay));
    let handle = timer.handle();
    let session = Arc::clone(session);

    timer.register_callback(move || {
        match session.lock() {
            Ok(mut session) => {
                info!("Reading time reached {} milestone", milestone);
                session.guard("time milestone", |tracker| tracker.on_time_reached(milestone));
            }
            Err(e) => error!("Failed to lock page view session: {}", e),
        }
        handle.cancel();
    });

    timer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::TrackerSettings,
        services::MemorySink,
        state::{PageView, PageViewInit},
    };
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn milestone_timer_sets_time_flag_once() {
        let page = PageView::start(
            1,
            PageViewInit {
                url: "https://example.com/a".to_string(),
                article: Some(vec!["word ".repeat(1000)]),
            },
            &TrackerSettings::default(),
            Arc::new(MemorySink::new()),
        );
        // 1000 words at 250 wpm: four minutes, medium after one, full after two
        let state = |page: &PageView| page.snapshot().unwrap().state.unwrap();

        sleep(Duration::from_secs(59)).await;
        assert!(!state(&page).medium_engagement);

        sleep(Duration::from_secs(2)).await;
        assert!(state(&page).medium_engagement);
        assert!(!state(&page).full_engagement);
        assert_eq!(page.snapshot().unwrap().active_timers, 1);

        sleep(Duration::from_secs(60)).await;
        assert!(state(&page).full_engagement);
        assert_eq!(page.snapshot().unwrap().active_timers, 0);
    }
}
