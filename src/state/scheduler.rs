//! Shared tick scheduler for all mounted timers

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace};

use super::{
    context::TickTarget,
    timer_state::{TimerCallback, TimerEvent, TimerInstance},
};
use crate::{countdown::Clock, tasks::TickSource};

/// Identifier handed out on registration
pub type TimerId = u64;

/// Default frame cadence, roughly 60 Hz
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Owns the live timers, the single tick source and the background flag.
///
/// Every operation that can cross an edge returns the callbacks to invoke.
/// They are meant to run after the caller has released the scheduler.
pub struct TimerScheduler {
    /// Live timers in registration order
    timers: Vec<(TimerId, TimerInstance)>,
    next_id: TimerId,
    tick_source: Box<dyn TickSource>,
    tick_interval: Duration,
    tick_target: TickTarget,
    /// Bumped whenever ticking starts or stops; older targets are refused
    tick_generation: u64,
    in_background: bool,
    clock: Arc<dyn Clock>,
}

impl TimerScheduler {
    pub(crate) fn new(
        tick_source: Box<dyn TickSource>,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
        tick_target: TickTarget,
    ) -> Self {
        Self {
            timers: Vec::new(),
            next_id: 1,
            tick_source,
            tick_interval,
            tick_target,
            tick_generation: 0,
            in_background: false,
            clock,
        }
    }

    /// Current time from the injected clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Add a timer to the end of the live set
    pub fn register(&mut self, instance: TimerInstance) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.timers.push((id, instance));
        debug!("Registered timer {} ({} live)", id, self.timers.len());
        id
    }

    /// Remove a timer. Stops the tick source once nothing is left.
    pub fn deregister(&mut self, id: TimerId) -> Option<TimerInstance> {
        let index = self.timers.iter().position(|(timer_id, _)| *timer_id == id)?;
        let (_, instance) = self.timers.remove(index);
        debug!("Deregistered timer {} ({} live)", id, self.timers.len());

        if self.timers.is_empty() {
            self.stop_ticking();
        }
        Some(instance)
    }

    /// Start the tick source unless it is already running
    pub fn ensure_started(&mut self) {
        if self.tick_source.is_active() {
            return;
        }
        info!("Starting tick source every {:?}", self.tick_interval);
        self.tick_generation += 1;
        let target = self.tick_target.for_generation(self.tick_generation);
        self.tick_source.start(self.tick_interval, target);
    }

    fn stop_ticking(&mut self) {
        if self.tick_source.is_active() {
            info!("No timers left, stopping tick source");
        }
        self.cancel_ticks();
    }

    /// Cancel the source and retire every target handed out so far. A tick
    /// already waiting on the scheduler lock is refused once it gets in.
    fn cancel_ticks(&mut self) {
        self.tick_generation += 1;
        self.tick_source.cancel();
    }

    /// Whether `generation` is the one currently allowed to tick
    pub(crate) fn accepts_tick(&self, generation: u64) -> bool {
        generation == self.tick_generation
    }

    /// Whether the tick source is currently delivering ticks
    pub fn is_ticking(&self) -> bool {
        self.tick_source.is_active()
    }

    /// Whether the app is currently in the background
    pub fn is_in_background(&self) -> bool {
        self.in_background
    }

    /// Period requested from the tick source
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Number of live timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether no timer is registered
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Ids of the live timers in registration order
    pub fn ids(&self) -> Vec<TimerId> {
        self.timers.iter().map(|(id, _)| *id).collect()
    }

    /// Look up a live timer
    pub fn timer(&self, id: TimerId) -> Option<&TimerInstance> {
        self.timers
            .iter()
            .find(|(timer_id, _)| *timer_id == id)
            .map(|(_, instance)| instance)
    }

    /// Look up a live timer for mutation. Edges crossed here are not reported.
    pub fn timer_mut(&mut self, id: TimerId) -> Option<&mut TimerInstance> {
        self.timers
            .iter_mut()
            .find(|(timer_id, _)| *timer_id == id)
            .map(|(_, instance)| instance)
    }

    /// Run a recomputing operation on one timer and collect its callback
    pub fn with_timer<F>(&mut self, id: TimerId, operation: F) -> Vec<TimerCallback>
    where
        F: FnOnce(&mut TimerInstance, DateTime<Utc>) -> Option<TimerEvent>,
    {
        let now = self.now();
        let mut pending = Vec::new();
        if let Some(instance) = self.timer_mut(id) {
            let event = operation(instance, now);
            collect(id, instance, event, &mut pending);
        }
        pending
    }

    /// Mark a timer running and make sure ticks are flowing
    pub fn start(&mut self, id: TimerId) {
        let Some(instance) = self.timer_mut(id) else {
            return;
        };
        instance.start();
        debug!("Timer {} started", id);
        self.ensure_started();
    }

    /// Update a timer's auto-start flag, starting ticks if that started it
    pub fn set_auto_start(&mut self, id: TimerId, auto_start: bool) {
        let started = self
            .timer_mut(id)
            .is_some_and(|instance| instance.set_auto_start(auto_start));
        if started {
            debug!("Timer {} auto-started", id);
            self.ensure_started();
        }
    }

    /// Advance every eligible timer once, in registration order.
    ///
    /// Timers flagged `pause_when_not_visible` are skipped while the app is in
    /// the background, without touching their flags, latches or display.
    pub fn on_tick(&mut self) -> Vec<TimerCallback> {
        let now = self.now();
        let in_background = self.in_background;
        let mut pending = Vec::new();

        for (id, instance) in self.timers.iter_mut() {
            if !instance.should_advance() {
                continue;
            }
            if instance.pause_when_not_visible() && in_background {
                trace!("Timer {} hidden, skipping tick", id);
                continue;
            }
            let event = instance.update(now);
            collect(*id, instance, event, &mut pending);
        }

        pending
    }

    /// Pause every timer that must not run in the background
    pub fn on_app_background(&mut self) {
        self.in_background = true;
        let mut paused = 0;
        for (_, instance) in self.timers.iter_mut() {
            if !instance.continue_in_background() {
                instance.pause();
                paused += 1;
            }
        }
        info!("App entered background, paused {} timers", paused);
    }

    /// Resume background-paused auto-start timers and refresh every timer
    pub fn on_app_foreground(&mut self) -> Vec<TimerCallback> {
        self.in_background = false;
        let mut resumed = 0;
        for (_, instance) in self.timers.iter_mut() {
            if !instance.continue_in_background() && instance.auto_start() {
                instance.resume();
                resumed += 1;
            }
        }
        info!("App entered foreground, resumed {} timers", resumed);

        let now = self.now();
        let mut pending = Vec::new();
        for (id, instance) in self.timers.iter_mut() {
            let event = instance.update(now);
            collect(*id, instance, event, &mut pending);
        }
        pending
    }

    /// Stop ticking regardless of live timers
    pub fn shutdown(&mut self) {
        self.cancel_ticks();
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.cancel_ticks();
    }
}

fn collect(
    id: TimerId,
    instance: &TimerInstance,
    event: Option<TimerEvent>,
    pending: &mut Vec<TimerCallback>,
) {
    let Some(event) = event else {
        return;
    };
    match event {
        TimerEvent::Expired => info!("Timer {} expired", id),
        TimerEvent::Critical => info!("Timer {} entered critical window", id),
    }
    if let Some(callback) = instance.handler(event) {
        pending.push(callback);
    }
}
