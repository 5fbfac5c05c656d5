//! Background tasks module
//!
//! This module contains the tick sources that drive the scheduler and the
//! task that forwards app lifecycle signals to it.

pub mod app_lifecycle;
pub mod tick_source;

// Re-export main types and functions
pub use app_lifecycle::app_lifecycle_task;
pub use tick_source::{ManualTickSource, TickSource, TokioTickSource};
