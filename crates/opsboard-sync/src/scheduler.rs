//! # Refresh Scheduler
//!
//! Decides when refresh cycles run: once at launch, then on a fixed interval
//! while the dashboard is visible and auto-refresh is on, plus on demand.
//!
//! ## Timer Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scheduler States                                 │
//! │                                                                         │
//! │   launch() ──► refresh(Startup) ──► arm()                               │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                              ┌─────────────────┐                        │
//! │   set_visibility(Visible)    │      ARMED      │  tick every interval   │
//! │   set_auto_refresh(true)     │   (timer task)  │──► refresh(Interval)   │
//! │         ┌───────────────────►│                 │                        │
//! │         │                    └────────┬────────┘                        │
//! │         │                             │ set_visibility(Hidden)          │
//! │         │                             │ set_auto_refresh(false)         │
//! │         │                             ▼                                 │
//! │         │                    ┌─────────────────┐                        │
//! │         └────────────────────│    DISARMED     │                        │
//! │                              └─────────────────┘                        │
//! │                                                                         │
//! │   trigger(Manual | Keyboard) runs immediately in either state and goes  │
//! │   through the controller's single-flight guard.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! At most one timer task exists at any time: arming aborts the previous one.
//! Each tick spawns its cycle as a separate task, so aborting the timer only
//! cancels the wait for the next tick. A cycle that has started always runs
//! to completion.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::controller::{RefreshOutcome, RefreshTrigger, SyncController};

// =============================================================================
// Refresh Target
// =============================================================================

/// Something that can run a refresh cycle.
pub trait RefreshTarget: Send + Sync + 'static {
    fn refresh(&self, trigger: RefreshTrigger) -> impl Future<Output = RefreshOutcome> + Send;
}

impl RefreshTarget for SyncController {
    fn refresh(&self, trigger: RefreshTrigger) -> impl Future<Output = RefreshOutcome> + Send {
        SyncController::refresh(self, trigger)
    }
}

/// Page visibility as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Returns true for the refresh shortcuts: F5, or Ctrl+R.
pub fn is_refresh_shortcut(key: &str, ctrl: bool) -> bool {
    key == "F5" || (ctrl && key.eq_ignore_ascii_case("r"))
}

// =============================================================================
// Scheduler
// =============================================================================

struct SchedulerState {
    timer: Option<JoinHandle<()>>,
    visibility: Visibility,
    auto_refresh: bool,
}

pub struct RefreshScheduler<T: RefreshTarget> {
    target: Arc<T>,
    interval: Duration,
    state: Mutex<SchedulerState>,
}

impl<T: RefreshTarget> RefreshScheduler<T> {
    pub fn new(target: Arc<T>, interval: Duration) -> Self {
        RefreshScheduler {
            target,
            interval,
            state: Mutex::new(SchedulerState {
                timer: None,
                visibility: Visibility::Visible,
                auto_refresh: true,
            }),
        }
    }

    /// Runs the initial refresh, then arms the periodic timer.
    pub async fn launch(&self) -> RefreshOutcome {
        info!(interval = ?self.interval, "Scheduler launching");
        let outcome = self.target.refresh(RefreshTrigger::Startup).await;

        let state = self.state.lock().await;
        let should_arm = state.auto_refresh && state.visibility == Visibility::Visible;
        drop(state);
        if should_arm {
            self.arm().await;
        }
        outcome
    }

    /// (Re)starts the periodic timer. The first tick fires one full
    /// interval from now.
    pub async fn arm(&self) {
        let mut state = self.state.lock().await;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let target = self.target.clone();
        let period = self.interval;
        state.timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let target = target.clone();
                tokio::spawn(async move {
                    let outcome = target.refresh(RefreshTrigger::Interval).await;
                    debug!(?outcome, "Scheduled refresh finished");
                });
            }
        }));
        debug!("Refresh timer armed");
    }

    /// Cancels the periodic timer. An in-flight cycle is never interrupted.
    pub async fn disarm(&self) {
        let mut state = self.state.lock().await;
        if let Some(timer) = state.timer.take() {
            timer.abort();
            debug!("Refresh timer disarmed");
        }
    }

    pub async fn is_armed(&self) -> bool {
        self.state.lock().await.timer.is_some()
    }

    /// Hidden pauses the timer; Visible resumes it when auto-refresh is on.
    pub async fn set_visibility(&self, visibility: Visibility) {
        let mut state = self.state.lock().await;
        if state.visibility == visibility {
            return;
        }
        state.visibility = visibility;
        let auto_refresh = state.auto_refresh;
        drop(state);

        match visibility {
            Visibility::Hidden => {
                info!("Dashboard hidden, pausing auto-refresh");
                self.disarm().await;
            }
            Visibility::Visible if auto_refresh => {
                info!("Dashboard visible, resuming auto-refresh");
                self.arm().await;
            }
            Visibility::Visible => {}
        }
    }

    /// Turns periodic refresh on or off.
    pub async fn set_auto_refresh(&self, enabled: bool) {
        let mut state = self.state.lock().await;
        state.auto_refresh = enabled;
        let visible = state.visibility == Visibility::Visible;
        drop(state);

        info!(enabled, "Auto-refresh toggled");
        if enabled && visible {
            self.arm().await;
        } else if !enabled {
            self.disarm().await;
        }
    }

    pub async fn auto_refresh(&self) -> bool {
        self.state.lock().await.auto_refresh
    }

    /// Refreshes immediately.
    pub async fn trigger(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        debug!(%trigger, "On-demand refresh");
        self.target.refresh(trigger).await
    }

    /// Stops the timer for good.
    pub async fn shutdown(&self) {
        self.disarm().await;
        info!("Scheduler stopped");
    }
}

impl<T: RefreshTarget> Drop for RefreshScheduler<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    const INTERVAL: Duration = Duration::from_secs(300);
    const EPSILON: Duration = Duration::from_millis(10);

    #[derive(Default)]
    struct CountingTarget {
        calls: AtomicUsize,
        triggers: StdMutex<Vec<RefreshTrigger>>,
    }

    impl CountingTarget {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RefreshTarget for CountingTarget {
        fn refresh(&self, trigger: RefreshTrigger) -> impl Future<Output = RefreshOutcome> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.triggers.lock().unwrap().push(trigger);
            async { RefreshOutcome::Live }
        }
    }

    fn scheduler() -> (Arc<CountingTarget>, RefreshScheduler<CountingTarget>) {
        let target = Arc::new(CountingTarget::default());
        (target.clone(), RefreshScheduler::new(target, INTERVAL))
    }

    const CYCLE: Duration = Duration::from_secs(30);

    /// Takes `CYCLE` to finish each refresh.
    #[derive(Default)]
    struct SlowTarget {
        started: AtomicUsize,
        finished: AtomicUsize,
    }

    impl RefreshTarget for SlowTarget {
        fn refresh(&self, _trigger: RefreshTrigger) -> impl Future<Output = RefreshOutcome> + Send {
            self.started.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(CYCLE).await;
                self.finished.fetch_add(1, Ordering::SeqCst);
                RefreshOutcome::Live
            }
        }
    }

    fn slow_scheduler() -> (Arc<SlowTarget>, RefreshScheduler<SlowTarget>) {
        let target = Arc::new(SlowTarget::default());
        (target.clone(), RefreshScheduler::new(target, INTERVAL))
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_refreshes_then_ticks() {
        let (target, scheduler) = scheduler();

        assert_eq!(scheduler.launch().await, RefreshOutcome::Live);
        assert_eq!(target.calls(), 1);
        assert!(scheduler.is_armed().await);

        tokio::time::sleep(INTERVAL - EPSILON).await;
        assert_eq!(target.calls(), 1);

        tokio::time::sleep(INTERVAL + EPSILON * 2).await;
        assert_eq!(target.calls(), 3);

        let triggers = target.triggers.lock().unwrap().clone();
        assert_eq!(triggers[0], RefreshTrigger::Startup);
        assert!(triggers[1..].iter().all(|t| *t == RefreshTrigger::Interval));
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_is_idempotent() {
        let (target, scheduler) = scheduler();

        scheduler.arm().await;
        scheduler.arm().await;
        scheduler.arm().await;

        tokio::time::sleep(INTERVAL + EPSILON).await;
        assert_eq!(target.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_full_interval() {
        let (target, scheduler) = scheduler();
        scheduler.arm().await;

        tokio::time::sleep(INTERVAL / 2).await;
        scheduler.arm().await;

        tokio::time::sleep(INTERVAL / 2 + EPSILON).await;
        assert_eq!(target.calls(), 0);

        tokio::time::sleep(INTERVAL / 2).await;
        assert_eq!(target.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_pauses_and_visible_resumes() {
        let (target, scheduler) = scheduler();
        scheduler.launch().await;

        scheduler.set_visibility(Visibility::Hidden).await;
        assert!(!scheduler.is_armed().await);

        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(target.calls(), 1);

        scheduler.set_visibility(Visibility::Visible).await;
        assert!(scheduler.is_armed().await);
        assert_eq!(target.calls(), 1);

        tokio::time::sleep(INTERVAL + EPSILON).await;
        assert_eq!(target.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_toggle() {
        let (target, scheduler) = scheduler();
        scheduler.launch().await;

        scheduler.set_auto_refresh(false).await;
        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(target.calls(), 1);

        // Visible again does not resume while auto-refresh is off.
        scheduler.set_visibility(Visibility::Hidden).await;
        scheduler.set_visibility(Visibility::Visible).await;
        assert!(!scheduler.is_armed().await);

        scheduler.set_auto_refresh(true).await;
        tokio::time::sleep(INTERVAL + EPSILON).await;
        assert_eq!(target.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_on_while_hidden_stays_disarmed() {
        let (_target, scheduler) = scheduler();
        scheduler.set_visibility(Visibility::Hidden).await;
        scheduler.set_auto_refresh(true).await;
        assert!(!scheduler.is_armed().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_trigger_works_while_disarmed() {
        let (target, scheduler) = scheduler();
        scheduler.set_visibility(Visibility::Hidden).await;

        scheduler.trigger(RefreshTrigger::Manual).await;
        scheduler.trigger(RefreshTrigger::Keyboard).await;
        assert_eq!(target.calls(), 2);
        assert_eq!(
            *target.triggers.lock().unwrap(),
            vec![RefreshTrigger::Manual, RefreshTrigger::Keyboard]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_stops_ticks() {
        let (target, scheduler) = scheduler();
        scheduler.arm().await;
        scheduler.disarm().await;
        scheduler.disarm().await;

        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(target.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hiding_mid_cycle_lets_cycle_finish() {
        let (target, scheduler) = slow_scheduler();
        scheduler.arm().await;

        tokio::time::sleep(INTERVAL + EPSILON).await;
        assert_eq!(target.started.load(Ordering::SeqCst), 1);
        assert_eq!(target.finished.load(Ordering::SeqCst), 0);

        scheduler.set_visibility(Visibility::Hidden).await;
        assert!(!scheduler.is_armed().await);

        tokio::time::sleep(CYCLE).await;
        assert_eq!(target.finished.load(Ordering::SeqCst), 1);
        assert_eq!(target.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_mid_cycle_lets_cycle_finish() {
        let (target, scheduler) = slow_scheduler();
        scheduler.arm().await;

        tokio::time::sleep(INTERVAL + EPSILON).await;
        assert_eq!(target.started.load(Ordering::SeqCst), 1);

        scheduler.set_auto_refresh(true).await;
        assert!(scheduler.is_armed().await);

        tokio::time::sleep(CYCLE).await;
        assert_eq!(target.finished.load(Ordering::SeqCst), 1);
        assert_eq!(target.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_flag_tracks_toggle() {
        let (_target, scheduler) = scheduler();
        assert!(scheduler.auto_refresh().await);
        scheduler.set_auto_refresh(false).await;
        assert!(!scheduler.auto_refresh().await);
    }

    #[test]
    fn test_refresh_shortcut() {
        assert!(is_refresh_shortcut("F5", false));
        assert!(is_refresh_shortcut("F5", true));
        assert!(is_refresh_shortcut("r", true));
        assert!(is_refresh_shortcut("R", true));
        assert!(!is_refresh_shortcut("r", false));
        assert!(!is_refresh_shortcut("F4", false));
    }
}
