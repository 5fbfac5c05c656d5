//! Host view adapters
//!
//! The timer core never draws anything itself. It pushes text and color to a
//! [`TimerDisplay`] supplied by the host when the timer is mounted.

pub mod display;

pub use display::{BufferedDisplay, DisplaySnapshot, TimerDisplay};
