//! Countdown arithmetic module
//!
//! Pure functions that turn an end time into remaining-time components and
//! render those components as display strings. Nothing in here holds state.

pub mod clock;
pub mod format;
pub mod remaining;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use format::{format_time, TimeFormat};
pub use remaining::{compute_remaining, parse_end_time, TimerData};
