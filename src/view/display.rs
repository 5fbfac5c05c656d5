//! Display adapter trait and a buffering implementation

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::utils::lock;

/// Host view that shows a timer's text
pub trait TimerDisplay: Send {
    fn set_text(&mut self, text: &str);

    /// `color` is passed through exactly as configured on the timer.
    fn set_color(&mut self, color: &str);
}

/// Last values pushed to a [`BufferedDisplay`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub text: String,
    pub color: Option<String>,
    /// Number of text pushes received so far
    pub redraws: u64,
}

/// Display that keeps what it was told to show. Clones share the same buffer,
/// so the host can keep one clone and hand the other to the timer.
#[derive(Debug, Clone, Default)]
pub struct BufferedDisplay {
    state: Arc<Mutex<DisplaySnapshot>>,
}

impl BufferedDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        lock(&self.state).clone()
    }

    pub fn text(&self) -> String {
        lock(&self.state).text.clone()
    }

    pub fn color(&self) -> Option<String> {
        lock(&self.state).color.clone()
    }
}

impl TimerDisplay for BufferedDisplay {
    fn set_text(&mut self, text: &str) {
        let mut state = lock(&self.state);
        state.text = text.to_string();
        state.redraws += 1;
    }

    fn set_color(&mut self, color: &str) {
        lock(&self.state).color = Some(color.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_display_shares_state() {
        let display = BufferedDisplay::new();
        let mut handed_out = display.clone();

        handed_out.set_text("00:10");
        handed_out.set_text("00:09");
        handed_out.set_color("#FF0000");

        let snapshot = display.snapshot();
        assert_eq!(snapshot.text, "00:09");
        assert_eq!(snapshot.color.as_deref(), Some("#FF0000"));
        assert_eq!(snapshot.redraws, 2);
    }
}
