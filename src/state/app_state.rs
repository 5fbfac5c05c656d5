//! Host-side registry of mounted timers

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Instant,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{TimerContext, TimerEvent, TimerId, TimerPhase, TimerProps, TimerView};
use crate::{
    countdown::{TimeFormat, TimerData},
    error::TimerError,
    utils::lock,
    view::{BufferedDisplay, DisplaySnapshot},
};

/// How many times each callback fired for one timer
#[derive(Debug, Default)]
pub struct EventCounts {
    expired: AtomicU64,
    critical: AtomicU64,
}

impl EventCounts {
    pub fn record(&self, event: TimerEvent) {
        let counter = match event {
            TimerEvent::Expired => &self.expired,
            TimerEvent::Critical => &self.critical,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FiredEvents {
        FiredEvents {
            expired: self.expired.load(Ordering::Relaxed),
            critical: self.critical.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredEvents {
    pub expired: u64,
    pub critical: u64,
}

/// Everything the host knows about one mounted timer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub id: TimerId,
    pub phase: TimerPhase,
    pub running: bool,
    pub paused: bool,
    pub end_time: String,
    pub format: String,
    pub time: TimerData,
    pub display: DisplaySnapshot,
    pub events: FiredEvents,
}

struct MountedTimer {
    view: TimerView,
    display: BufferedDisplay,
    events: Arc<EventCounts>,
}

impl MountedTimer {
    /// Every field is read under one scheduler lock, so a tick can't land
    /// between the phase and the remaining time.
    fn snapshot(&self) -> TimerSnapshot {
        let id = self.view.id();
        self.view
            .inspect(|timer, now| TimerSnapshot {
                id,
                phase: timer.phase(),
                running: timer.is_running(),
                paused: timer.is_paused(),
                end_time: timer.end_time_input().to_string(),
                format: timer.format().as_str().to_string(),
                time: timer.current_time(now),
                display: self.display.snapshot(),
                events: self.events.snapshot(),
            })
            .unwrap_or_else(|| TimerSnapshot {
                id,
                phase: TimerPhase::Idle,
                running: false,
                paused: false,
                end_time: String::new(),
                format: TimeFormat::default().as_str().to_string(),
                time: TimerData::expired(),
                display: self.display.snapshot(),
                events: self.events.snapshot(),
            })
    }
}

/// Main application state for the headless host
pub struct AppState {
    /// Shared scheduler driving every mounted timer
    pub context: TimerContext,
    timers: Mutex<BTreeMap<TimerId, MountedTimer>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    pub fn new(context: TimerContext, port: u16, host: String) -> Self {
        Self {
            context,
            timers: Mutex::new(BTreeMap::new()),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Mount a new timer. Callbacks are wired before props are applied so an
    /// end time already in the past still counts as an expiry.
    pub fn mount_timer(&self, props: &TimerProps) -> TimerSnapshot {
        let display = BufferedDisplay::new();
        let events = Arc::new(EventCounts::default());
        let view = self.context.mount(display.clone());
        let id = view.id();

        let expired = Arc::clone(&events);
        view.on_expired(move || {
            info!("Timer {} fired onExpired", id);
            expired.record(TimerEvent::Expired);
        });
        let critical = Arc::clone(&events);
        view.on_critical(move || {
            info!("Timer {} fired onCritical", id);
            critical.record(TimerEvent::Critical);
        });
        view.apply_props(props);

        let mounted = MountedTimer {
            view,
            display,
            events,
        };
        let snapshot = mounted.snapshot();
        lock(&self.timers).insert(id, mounted);
        self.record_action(format!("mount {}", id));
        info!("Mounted timer {}", id);
        snapshot
    }

    pub fn unmount_timer(&self, id: TimerId) -> Result<(), TimerError> {
        let removed = lock(&self.timers)
            .remove(&id)
            .ok_or(TimerError::UnknownTimer(id))?;
        drop(removed);
        self.record_action(format!("unmount {}", id));
        info!("Unmounted timer {}", id);
        Ok(())
    }

    /// Run `operation` against a mounted timer and return its fresh snapshot
    pub fn update_timer<F>(&self, id: TimerId, action: &str, operation: F) -> Result<TimerSnapshot, TimerError>
    where
        F: FnOnce(&TimerView),
    {
        let timers = lock(&self.timers);
        let mounted = timers.get(&id).ok_or(TimerError::UnknownTimer(id))?;
        operation(&mounted.view);
        let snapshot = mounted.snapshot();
        drop(timers);

        self.record_action(format!("{} {}", action, id));
        Ok(snapshot)
    }

    pub fn timer_snapshot(&self, id: TimerId) -> Result<TimerSnapshot, TimerError> {
        lock(&self.timers)
            .get(&id)
            .map(MountedTimer::snapshot)
            .ok_or(TimerError::UnknownTimer(id))
    }

    pub fn timer_snapshots(&self) -> Vec<TimerSnapshot> {
        lock(&self.timers)
            .values()
            .map(MountedTimer::snapshot)
            .collect()
    }

    pub fn enter_background(&self) {
        self.context.app_did_enter_background();
        self.record_action("background".to_string());
    }

    pub fn enter_foreground(&self) {
        self.context.app_will_enter_foreground();
        self.record_action("foreground".to_string());
    }

    fn record_action(&self, action: String) {
        *lock(&self.last_action) = Some(action);
        *lock(&self.last_action_time) = Some(Utc::now());
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
        let last_action = lock(&self.last_action).clone();
        let last_action_time = *lock(&self.last_action_time);
        (last_action, last_action_time)
    }
}
