//! Repeating countdown timer with registered callbacks

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::{
    task::AbortHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, warn};

/// Tick period used when none (or zero) is given
pub const DEFAULT_FREQUENCY: Duration = Duration::from_millis(1000);

/// Zero-argument callback invoked on every tick
pub type Callback = Box<dyn FnMut() + Send + 'static>;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Cancellation handle shared with callbacks
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
    task: AbortHandle,
}

impl TimerHandle {
    /// Stop the timer. Calling this more than once, or from inside one of
    /// the timer's own callbacks, is fine.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            debug!("Timer {} cancelled", self.id);
            self.task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Repeating countdown that runs its callbacks on every tick until cancelled.
///
/// Must be created inside a tokio runtime. Dropping the timer cancels it.
pub struct Timer {
    handle: TimerHandle,
    period: Duration,
    callbacks: Arc<Mutex<Vec<Callback>>>,
}

impl Timer {
    /// Start a timer ticking every `freq`; the first tick comes after one full period
    pub fn new(freq: Option<Duration>) -> Self {
        let period = match freq {
            Some(freq) if !freq.is_zero() => freq,
            _ => DEFAULT_FREQUENCY,
        };
        let id = NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));
        let callbacks: Arc<Mutex<Vec<Callback>>> = Arc::new(Mutex::new(Vec::new()));

        let task = tokio::spawn(run_timer(
            id,
            period,
            Arc::clone(&cancelled),
            Arc::clone(&callbacks),
        ));

        debug!("Timer {} started with period {:?}", id, period);
        Self {
            handle: TimerHandle {
                id,
                cancelled,
                task: task.abort_handle(),
            },
            period,
            callbacks,
        }
    }

    /// Identifier of a running timer, `None` once cancelled
    pub fn id(&self) -> Option<u64> {
        if self.handle.is_cancelled() {
            None
        } else {
            Some(self.handle.id)
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Append a callback; callbacks run in registration order
    pub fn register_callback<F>(&self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        match self.callbacks.lock() {
            Ok(mut callbacks) => callbacks.push(Box::new(callback)),
            Err(e) => warn!("Failed to register callback on timer {}: {}", self.handle.id, e),
        }
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Handle for cancelling this timer from elsewhere, including its own callbacks
    pub fn handle(&self) -> TimerHandle {
        self.handle.clone()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.handle.id)
            .field("period", &self.period)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

async fn run_timer(
    id: u64,
    period: Duration,
    cancelled: Arc<AtomicBool>,
    callbacks: Arc<Mutex<Vec<Callback>>>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if cancelled.load(Ordering::SeqCst) {
            break;
        }

        // Run without holding the lock so callbacks may register more callbacks
        let mut current = match callbacks.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => break,
        };
        debug!("Timer {} tick, {} callback(s)", id, current.len());
        for callback in current.iter_mut() {
            callback();
        }

        match callbacks.lock() {
            Ok(mut guard) => {
                let added = std::mem::replace(&mut *guard, current);
                guard.extend(added);
            }
            Err(_) => break,
        }

        if cancelled.load(Ordering::SeqCst) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn callbacks_run_every_tick_in_order() {
        let timer = Timer::new(Some(Duration::from_millis(100)));
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b"] {
            let log = Arc::clone(&log);
            timer.register_callback(move || log.lock().unwrap().push(name));
        }

        sleep(Duration::from_millis(250)).await;
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_before_first_period() {
        let timer = Timer::new(Some(Duration::from_millis(300)));
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        timer.register_callback(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(299)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_from_callback_stops_further_ticks() {
        let timer = Timer::new(Some(Duration::from_millis(50)));
        let count = Arc::new(AtomicUsize::new(0));
        let handle = timer.handle();
        let c = Arc::clone(&count);
        timer.register_callback(move || {
            c.fetch_add(1, Ordering::SeqCst);
            handle.cancel();
            handle.cancel();
        });

        sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(timer.is_cancelled());
        assert_eq!(timer.id(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_prevents_callbacks() {
        let timer = Timer::new(Some(Duration::from_millis(10)));
        assert!(timer.id().is_some());
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        timer.register_callback(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        timer.cancel();
        timer.cancel();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn register_on_poisoned_timer_does_not_panic() {
        let timer = Timer::new(Some(Duration::from_millis(10)));
        let callbacks = Arc::clone(&timer.callbacks);
        let _ = std::thread::spawn(move || {
            let _guard = callbacks.lock().unwrap();
            panic!("poison the callback list");
        })
        .join();

        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        timer.register_callback(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_frequency_uses_default() {
        let timer = Timer::new(Some(Duration::ZERO));
        assert_eq!(timer.period(), DEFAULT_FREQUENCY);
        assert_eq!(Timer::new(None).period(), DEFAULT_FREQUENCY);
    }

    #[tokio::test(start_paused = true)]
    async fn callback_may_register_another() {
        let timer = Arc::new(Timer::new(Some(Duration::from_millis(100))));
        let count = Arc::new(AtomicUsize::new(0));
        let registered = Arc::new(AtomicBool::new(false));
        {
            let timer_ref = Arc::downgrade(&timer);
            let count = Arc::clone(&count);
            timer.register_callback(move || {
                if !registered.swap(true, Ordering::SeqCst) {
                    if let Some(timer) = timer_ref.upgrade() {
                        let count = Arc::clone(&count);
                        timer.register_callback(move || {
                            count.fetch_add(1, Ordering::SeqCst);
                        });
                    }
                }
            });
        }

        sleep(Duration::from_millis(250)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_timer_cancels_it() {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = {
            let timer = Timer::new(Some(Duration::from_millis(10)));
            let c = Arc::clone(&count);
            timer.register_callback(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
            timer.handle()
        };

        sleep(Duration::from_millis(100)).await;
        assert!(handle.is_cancelled());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
