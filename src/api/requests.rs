//! API request bodies

use serde::Deserialize;

use crate::state::TimerView;

/// Partial property update; only present fields are applied
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerPropsPatch {
    pub end_time: Option<String>,
    pub auto_start: Option<bool>,
    pub critical_threshold: Option<f64>,
    pub format: Option<String>,
    pub show_days: Option<bool>,
    pub hide_zero_hours: Option<bool>,
    pub text_color: Option<String>,
    pub critical_color: Option<String>,
    pub pause_when_not_visible: Option<bool>,
    pub continue_in_background: Option<bool>,
}

impl TimerPropsPatch {
    /// Apply through the view's setters, in the same order as a full mount
    pub fn apply_to(&self, view: &TimerView) {
        if let Some(format) = &self.format {
            view.set_format(format);
        }
        if let Some(show_days) = self.show_days {
            view.set_show_days(show_days);
        }
        if let Some(hide_zero_hours) = self.hide_zero_hours {
            view.set_hide_zero_hours(hide_zero_hours);
        }
        if let Some(threshold) = self.critical_threshold {
            view.set_critical_threshold(threshold);
        }
        if let Some(color) = &self.text_color {
            view.set_text_color(color);
        }
        if let Some(color) = &self.critical_color {
            view.set_critical_color(color);
        }
        if let Some(pause) = self.pause_when_not_visible {
            view.set_pause_when_not_visible(pause);
        }
        if let Some(continue_in_background) = self.continue_in_background {
            view.set_continue_in_background(continue_in_background);
        }
        if let Some(end_time) = &self.end_time {
            view.set_end_time(end_time);
        }
        if let Some(auto_start) = self.auto_start {
            view.set_auto_start(auto_start);
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddSecondsRequest {
    pub seconds: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndTimeRequest {
    pub end_time: String,
}
