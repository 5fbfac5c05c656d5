//! State management module
//!
//! Per-timer countdown state, the shared tick scheduler that drives it, and
//! the host-side registry of mounted timers.

pub mod app_state;
pub mod context;
pub mod scheduler;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, EventCounts};
pub use context::{TickTarget, TimerContext, TimerView};
pub use scheduler::{TimerId, TimerScheduler, DEFAULT_TICK_INTERVAL};
pub use timer_state::{TimerCallback, TimerEvent, TimerInstance, TimerPhase, TimerProps};
