//! Periodic tick sources

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::debug;

use crate::{state::TickTarget, utils::lock};

const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Periodic callback the scheduler can start and cancel
pub trait TickSource: Send {
    /// Begin delivering ticks to `target` every `period`
    fn start(&mut self, period: Duration, target: TickTarget);

    /// Stop delivering ticks. Must not deliver any tick after returning.
    fn cancel(&mut self);

    fn is_active(&self) -> bool;
}

/// Tick source backed by a Tokio task and `tokio::time::interval`
#[derive(Debug)]
pub struct TokioTickSource {
    runtime: Handle,
    task: Option<JoinHandle<()>>,
}

impl TokioTickSource {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            task: None,
        }
    }
}

impl TickSource for TokioTickSource {
    fn start(&mut self, period: Duration, target: TickTarget) {
        self.cancel();
        self.task = Some(self.runtime.spawn(tick_loop(period, target)));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TokioTickSource {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Deliver ticks until the target is cancelled or its context goes away.
///
/// A single task awaits each tick before the next one, so ticks never overlap;
/// ticks missed while a slow update was running are skipped, not replayed.
async fn tick_loop(period: Duration, target: TickTarget) {
    let mut ticker = interval(period.max(MIN_TICK_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick completes immediately; the first update lands one period in.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if !target.tick() {
            debug!("Tick target retired, tick loop exiting");
            break;
        }
    }
}

#[derive(Debug, Default)]
struct ManualTickState {
    target: Option<TickTarget>,
    period: Option<Duration>,
    starts: usize,
    cancels: usize,
}

/// Tick source driven by explicit [`fire`](ManualTickSource::fire) calls.
///
/// Useful for hosts that already own a frame callback and for tests.
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct ManualTickSource {
    state: Arc<Mutex<ManualTickState>>,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one tick if started. Returns whether a tick was delivered.
    pub fn fire(&self) -> bool {
        let target = lock(&self.state).target.clone();
        target.is_some_and(|target| target.tick())
    }

    pub fn target(&self) -> Option<TickTarget> {
        lock(&self.state).target.clone()
    }

    pub fn period(&self) -> Option<Duration> {
        lock(&self.state).period
    }

    pub fn starts(&self) -> usize {
        lock(&self.state).starts
    }

    pub fn cancels(&self) -> usize {
        lock(&self.state).cancels
    }
}

impl TickSource for ManualTickSource {
    fn start(&mut self, period: Duration, target: TickTarget) {
        let mut state = lock(&self.state);
        state.target = Some(target);
        state.period = Some(period);
        state.starts += 1;
    }

    fn cancel(&mut self) {
        let mut state = lock(&self.state);
        if state.target.take().is_some() {
            state.cancels += 1;
        }
    }

    fn is_active(&self) -> bool {
        lock(&self.state).target.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        countdown::{Clock, SystemClock},
        state::{TimerContext, TimerProps},
        view::BufferedDisplay,
    };
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_tokio_source_drives_updates() {
        let context = TimerContext::new(
            TokioTickSource::new(Handle::current()),
            SystemClock,
            Duration::from_millis(5),
        );
        let display = BufferedDisplay::new();
        let view = context.mount_with(display.clone(), &TimerProps::default());
        view.set_end_at(Some(Utc::now() + chrono::Duration::hours(1)));

        let expired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&expired);
        view.on_expired(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(context.is_ticking());

        let redraws = display.snapshot().redraws;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(display.snapshot().redraws > redraws);

        view.set_end_at(Some(Utc::now() - chrono::Duration::seconds(1)));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert_eq!(display.text(), "00:00:00");

        drop(view);
        assert!(!context.is_ticking());
    }

    /// Clock that counts reads and holds the scheduler lock a little while
    struct SlowClock {
        reads: Arc<AtomicUsize>,
    }

    impl Clock for SlowClock {
        fn now(&self) -> DateTime<Utc> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(3));
            Utc::now()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_tick_lands_after_shutdown() {
        for _ in 0..20 {
            let reads = Arc::new(AtomicUsize::new(0));
            let context = TimerContext::new(
                TokioTickSource::new(Handle::current()),
                SlowClock {
                    reads: Arc::clone(&reads),
                },
                Duration::from_millis(1),
            );
            let view = context.mount(BufferedDisplay::new());
            view.start();
            tokio::time::sleep(Duration::from_millis(10)).await;

            context.shutdown();
            assert!(!context.is_ticking());
            let settled = reads.load(Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            assert_eq!(reads.load(Ordering::SeqCst), settled);
        }
    }

    #[tokio::test]
    async fn test_tokio_source_cancel_stops_task() {
        let manual = ManualTickSource::new();
        let context = TimerContext::new(manual.clone(), SystemClock, Duration::from_millis(16));
        let view = context.mount(BufferedDisplay::new());
        view.start();
        let target = manual.target().expect("manual source started");

        let mut source = TokioTickSource::new(Handle::current());
        assert!(!source.is_active());
        source.start(Duration::ZERO, target);
        assert!(source.is_active());

        source.cancel();
        source.cancel();
        assert!(!source.is_active());
    }

    #[test]
    fn test_manual_source_counts_and_clears() {
        let ticks = ManualTickSource::new();
        let context = TimerContext::new(ticks.clone(), SystemClock, Duration::from_millis(16));
        assert!(!ticks.fire());

        let view = context.mount(BufferedDisplay::new());
        view.start();
        view.start();
        assert_eq!(ticks.starts(), 1);
        assert_eq!(ticks.period(), Some(Duration::from_millis(16)));
        assert!(ticks.fire());

        drop(view);
        assert_eq!(ticks.cancels(), 1);
        assert!(!ticks.fire());
    }
}
