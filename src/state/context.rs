//! Shared timer context and per-timer handles

use std::{
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{
    scheduler::{TimerId, TimerScheduler},
    timer_state::{TimerCallback, TimerEvent, TimerInstance, TimerPhase, TimerProps},
};
use crate::{
    countdown::{Clock, TimeFormat, TimerData},
    tasks::TickSource,
    utils::lock,
    view::TimerDisplay,
};

/// Owner of the scheduler. Cheap to clone; all clones drive the same timers.
#[derive(Clone)]
pub struct TimerContext {
    scheduler: Arc<Mutex<TimerScheduler>>,
}

impl TimerContext {
    /// Build a context around `tick_source`. Nothing ticks until a timer starts.
    pub fn new<S, C>(tick_source: S, clock: C, tick_interval: Duration) -> Self
    where
        S: TickSource + 'static,
        C: Clock + 'static,
    {
        let scheduler = Arc::new_cyclic(|handle| {
            Mutex::new(TimerScheduler::new(
                Box::new(tick_source),
                Arc::new(clock),
                tick_interval,
                TickTarget {
                    scheduler: handle.clone(),
                    generation: 0,
                },
            ))
        });
        Self { scheduler }
    }

    /// Mount a timer with default properties. It stays stopped until started
    /// or given props with `auto_start`.
    pub fn mount<D>(&self, display: D) -> TimerView
    where
        D: TimerDisplay + 'static,
    {
        let id = self
            .lock()
            .register(TimerInstance::new(Box::new(display)));
        TimerView {
            id,
            context: self.clone(),
        }
    }

    /// Mount a timer and apply `props` right away
    pub fn mount_with<D>(&self, display: D, props: &TimerProps) -> TimerView
    where
        D: TimerDisplay + 'static,
    {
        let view = self.mount(display);
        view.apply_props(props);
        view
    }

    /// Pause timers that must not run while the app is hidden
    pub fn app_did_enter_background(&self) {
        self.lock().on_app_background();
    }

    /// Resume background-paused timers and refresh every display
    pub fn app_will_enter_foreground(&self) {
        self.run(|scheduler| scheduler.on_app_foreground());
    }

    /// Whether the shared tick source is running
    pub fn is_ticking(&self) -> bool {
        self.lock().is_ticking()
    }

    /// Whether the app is currently in the background
    pub fn is_in_background(&self) -> bool {
        self.lock().is_in_background()
    }

    /// Number of mounted timers
    pub fn timer_count(&self) -> usize {
        self.lock().len()
    }

    /// Ids of the mounted timers in mount order
    pub fn timer_ids(&self) -> Vec<TimerId> {
        self.lock().ids()
    }

    /// Current time from the context's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.lock().now()
    }

    /// Stop the tick source. Mounted timers stay registered.
    pub fn shutdown(&self) {
        self.lock().shutdown();
    }

    fn lock(&self) -> MutexGuard<'_, TimerScheduler> {
        lock(&self.scheduler)
    }

    /// Run `operation` under the lock, then fire the returned callbacks
    fn run<F>(&self, operation: F)
    where
        F: FnOnce(&mut TimerScheduler) -> Vec<TimerCallback>,
    {
        let pending = operation(&mut self.lock());
        fire(pending);
    }
}

/// Weak handle a tick source uses to reach the scheduler.
///
/// Each start of the tick source hands out a target for a new generation.
/// Cancelling retires it, so a tick that was already waiting on the
/// scheduler when the source was cancelled does nothing.
#[derive(Debug, Clone)]
pub struct TickTarget {
    scheduler: Weak<Mutex<TimerScheduler>>,
    generation: u64,
}

impl TickTarget {
    pub(crate) fn for_generation(&self, generation: u64) -> Self {
        Self {
            scheduler: self.scheduler.clone(),
            generation,
        }
    }

    /// Deliver one tick. Returns false once the context is gone or the
    /// source this target was handed to has been cancelled.
    pub fn tick(&self) -> bool {
        let Some(shared) = self.scheduler.upgrade() else {
            return false;
        };
        let mut scheduler = lock(&shared);
        if !scheduler.accepts_tick(self.generation) {
            return false;
        }
        let pending = scheduler.on_tick();
        drop(scheduler);
        fire(pending);
        true
    }
}

fn fire(pending: Vec<TimerCallback>) {
    for callback in pending {
        callback();
    }
}

/// Handle to one mounted timer. Dropping it unmounts the timer.
pub struct TimerView {
    id: TimerId,
    context: TimerContext,
}

impl TimerView {
    /// Id assigned at mount
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Context this timer is mounted in
    pub fn context(&self) -> &TimerContext {
        &self.context
    }

    /// Apply every property in `props` through the regular setters.
    /// Display settings go first, auto start goes last.
    pub fn apply_props(&self, props: &TimerProps) {
        self.set_format(&props.format);
        self.set_show_days(props.show_days);
        self.set_hide_zero_hours(props.hide_zero_hours);
        self.set_critical_threshold(props.critical_threshold);
        self.set_text_color(&props.text_color);
        self.set_critical_color(&props.critical_color);
        self.set_pause_when_not_visible(props.pause_when_not_visible);
        self.set_continue_in_background(props.continue_in_background);
        if let Some(end_time) = &props.end_time {
            self.set_end_time(end_time);
        }
        self.set_auto_start(props.auto_start);
    }

    // Methods

    /// Mark running and make sure ticks are flowing
    pub fn start(&self) {
        self.context.lock().start(self.id);
    }

    /// Stop advancing on ticks. The end time is kept.
    pub fn pause(&self) {
        self.modify(TimerInstance::pause);
    }

    /// Continue advancing after a pause
    pub fn resume(&self) {
        self.modify(TimerInstance::resume);
    }

    /// Clear the expiry and critical latches and recompute
    pub fn reset(&self) {
        self.recompute(|timer, now| timer.reset(now));
    }

    /// Move the end time by `seconds`, which may be negative
    pub fn add_seconds(&self, seconds: f64) {
        self.recompute(|timer, now| timer.add_seconds(seconds, now));
    }

    /// Set the end time from an ISO-8601 string. Bad input leaves the timer idle.
    pub fn set_end_time(&self, end_time: &str) {
        self.recompute(|timer, now| timer.set_end_time(end_time, now));
    }

    /// Set or clear the end time directly
    pub fn set_end_at(&self, end_time: Option<DateTime<Utc>>) {
        self.recompute(|timer, now| timer.set_end_at(end_time, now));
    }

    /// Remaining time right now, without side effects
    pub fn current_time(&self) -> TimerData {
        self.inspect(|timer, now| timer.current_time(now))
            .unwrap_or_else(TimerData::expired)
    }

    /// Read the instance and the clock under one lock, so every value
    /// `reader` derives comes from the same moment. `None` once unmounted.
    pub fn inspect<R>(
        &self,
        reader: impl FnOnce(&TimerInstance, DateTime<Utc>) -> R,
    ) -> Option<R> {
        let scheduler = self.context.lock();
        let now = scheduler.now();
        scheduler.timer(self.id).map(|timer| reader(timer, now))
    }

    // Property setters

    /// Set auto start. Turning it on starts a stopped timer.
    pub fn set_auto_start(&self, auto_start: bool) {
        self.context.lock().set_auto_start(self.id, auto_start);
    }

    /// Seconds remaining at which the critical color kicks in
    pub fn set_critical_threshold(&self, seconds: f64) {
        self.modify(|timer| timer.set_critical_threshold(seconds));
    }

    /// Display pattern; unknown patterns fall back to `HH:MM:SS`
    pub fn set_format(&self, format: &str) {
        self.modify(|timer| timer.set_format(format));
    }

    /// Whether the padded pattern shows a day field
    pub fn set_show_days(&self, show_days: bool) {
        self.modify(|timer| timer.set_show_days(show_days));
    }

    /// Whether zero hours are dropped from the padded pattern
    pub fn set_hide_zero_hours(&self, hide_zero_hours: bool) {
        self.modify(|timer| timer.set_hide_zero_hours(hide_zero_hours));
    }

    /// Color outside the critical window
    pub fn set_text_color(&self, color: &str) {
        self.modify(|timer| timer.set_text_color(color));
    }

    /// Color inside the critical window
    pub fn set_critical_color(&self, color: &str) {
        self.modify(|timer| timer.set_critical_color(color));
    }

    /// Skip ticks while the app is in the background
    pub fn set_pause_when_not_visible(&self, pause: bool) {
        self.modify(|timer| timer.set_pause_when_not_visible(pause));
    }

    /// Keep running when the app goes to the background
    pub fn set_continue_in_background(&self, continue_in_background: bool) {
        self.modify(|timer| timer.set_continue_in_background(continue_in_background));
    }

    // Events

    /// Replace or clear the expiry handler
    pub fn set_on_expired(&self, callback: Option<TimerCallback>) {
        // Dropped outside the lock, like an unmounted instance.
        let previous = self.modify(|timer| timer.set_on_expired(callback));
        drop(previous);
    }

    /// Replace or clear the critical handler
    pub fn set_on_critical(&self, callback: Option<TimerCallback>) {
        let previous = self.modify(|timer| timer.set_on_critical(callback));
        drop(previous);
    }

    /// Register a closure to run once the timer expires
    pub fn on_expired<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.set_on_expired(Some(Arc::new(callback)));
    }

    /// Register a closure to run when the timer enters the critical window
    pub fn on_critical<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.set_on_critical(Some(Arc::new(callback)));
    }

    // Getters

    /// End time as last set, or empty
    pub fn end_time(&self) -> String {
        self.read(|timer| timer.end_time_input().to_string())
            .unwrap_or_default()
    }

    /// Whether the timer advances on ticks
    pub fn is_running(&self) -> bool {
        self.read(TimerInstance::is_running).unwrap_or(false)
    }

    /// Whether the timer is paused
    pub fn is_paused(&self) -> bool {
        self.read(TimerInstance::is_paused).unwrap_or(false)
    }

    /// Coarse lifecycle phase
    pub fn phase(&self) -> TimerPhase {
        self.read(TimerInstance::phase).unwrap_or(TimerPhase::Idle)
    }

    /// Current auto-start flag
    pub fn auto_start(&self) -> bool {
        self.read(TimerInstance::auto_start).unwrap_or(false)
    }

    /// Active display pattern
    pub fn format(&self) -> TimeFormat {
        self.read(TimerInstance::format).unwrap_or_default()
    }

    fn read<R>(&self, getter: impl FnOnce(&TimerInstance) -> R) -> Option<R> {
        self.context.lock().timer(self.id).map(getter)
    }

    fn modify<R>(&self, setter: impl FnOnce(&mut TimerInstance) -> R) -> Option<R> {
        self.context.lock().timer_mut(self.id).map(setter)
    }

    fn recompute<F>(&self, operation: F)
    where
        F: FnOnce(&mut TimerInstance, DateTime<Utc>) -> Option<TimerEvent>,
    {
        self.context
            .run(|scheduler| scheduler.with_timer(self.id, operation));
    }
}

impl Drop for TimerView {
    fn drop(&mut self) {
        // The instance is dropped after the lock is released, since its
        // callbacks may hold handles back into this context.
        let removed = self.context.lock().deregister(self.id);
        if removed.is_some() {
            debug!("Timer {} unmounted", self.id);
        }
        drop(removed);
    }
}
