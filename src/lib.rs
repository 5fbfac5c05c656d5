//! Countdown Timer - A countdown timer component core
//!
//! This library provides the per-instance countdown state machine, the shared
//! tick scheduler that drives every mounted timer from a single tick source,
//! and a headless HTTP host for driving timers without a native view.

pub mod api;
pub mod config;
pub mod countdown;
pub mod error;
pub mod state;
pub mod tasks;
pub mod utils;
pub mod view;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use countdown::{compute_remaining, format_time, TimeFormat, TimerData};
pub use error::TimerError;
pub use state::{AppState, TimerContext, TimerProps, TimerView};
pub use tasks::{ManualTickSource, TickSource, TokioTickSource};
pub use utils::signals::shutdown_signal;
pub use view::{BufferedDisplay, TimerDisplay};
