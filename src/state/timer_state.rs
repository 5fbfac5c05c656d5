//! Per-instance countdown state and its transitions

use std::{fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    countdown::{compute_remaining, format_time, parse_end_time, TimeFormat, TimerData},
    view::TimerDisplay,
};

/// Handler invoked when a timer crosses an edge
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

const DEFAULT_CRITICAL_THRESHOLD: f64 = 300.0;
const DEFAULT_TEXT_COLOR: &str = "#000000";
const DEFAULT_CRITICAL_COLOR: &str = "#FF0000";

/// Edge transitions reported by [`TimerInstance::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerEvent {
    Expired,
    Critical,
}

/// Coarse lifecycle phase, derived from the flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Stopped,
    Running,
    Paused,
    Expired,
}

/// Configurable timer properties as a host passes them in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerProps {
    pub end_time: Option<String>,
    pub auto_start: bool,
    pub critical_threshold: f64,
    pub format: String,
    pub show_days: bool,
    pub hide_zero_hours: bool,
    pub text_color: String,
    pub critical_color: String,
    pub pause_when_not_visible: bool,
    pub continue_in_background: bool,
}

impl Default for TimerProps {
    fn default() -> Self {
        Self {
            end_time: None,
            auto_start: true,
            critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
            format: TimeFormat::Padded.as_str().to_string(),
            show_days: true,
            hide_zero_hours: false,
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            critical_color: DEFAULT_CRITICAL_COLOR.to_string(),
            pause_when_not_visible: false,
            continue_in_background: true,
        }
    }
}

/// State of one mounted countdown
pub struct TimerInstance {
    end_time: Option<DateTime<Utc>>,
    end_time_input: String,
    is_running: bool,
    is_paused: bool,
    was_expired: bool,
    was_critical: bool,

    auto_start: bool,
    critical_threshold: f64,
    format: TimeFormat,
    show_days: bool,
    hide_zero_hours: bool,
    text_color: String,
    critical_color: String,
    pause_when_not_visible: bool,
    continue_in_background: bool,

    on_expired: Option<TimerCallback>,
    on_critical: Option<TimerCallback>,
    display: Box<dyn TimerDisplay>,
}

impl TimerInstance {
    /// Create an idle timer with default properties and show the zero state
    pub fn new(display: Box<dyn TimerDisplay>) -> Self {
        let defaults = TimerProps::default();
        let mut instance = Self {
            end_time: None,
            end_time_input: String::new(),
            is_running: false,
            is_paused: false,
            was_expired: false,
            was_critical: false,
            auto_start: defaults.auto_start,
            critical_threshold: defaults.critical_threshold,
            format: TimeFormat::from_pattern(&defaults.format),
            show_days: defaults.show_days,
            hide_zero_hours: defaults.hide_zero_hours,
            text_color: defaults.text_color,
            critical_color: defaults.critical_color,
            pause_when_not_visible: defaults.pause_when_not_visible,
            continue_in_background: defaults.continue_in_background,
            on_expired: None,
            on_critical: None,
            display,
        };
        instance.render_text(&TimerData::expired());
        instance
    }

    // Lifecycle

    /// Mark running and clear any pause
    pub fn start(&mut self) {
        self.is_running = true;
        self.is_paused = false;
    }

    /// Stop advancing on ticks
    pub fn pause(&mut self) {
        self.is_paused = true;
    }

    /// Continue advancing after a pause
    pub fn resume(&mut self) {
        self.is_paused = false;
    }

    /// Clear both latches and recompute
    pub fn reset(&mut self, now: DateTime<Utc>) -> Option<TimerEvent> {
        self.was_expired = false;
        self.was_critical = false;
        self.update(now)
    }

    /// Shift the end time. Does nothing when no end time is set.
    pub fn add_seconds(&mut self, delta: f64, now: DateTime<Utc>) -> Option<TimerEvent> {
        let end_time = self.end_time?;
        let shifted = Duration::try_milliseconds((delta * 1000.0) as i64)
            .and_then(|shift| end_time.checked_add_signed(shift));
        self.end_time = Some(shifted.unwrap_or(end_time));
        self.update(now)
    }

    /// Parse and apply an end time. Unparseable input leaves the timer idle.
    pub fn set_end_time(&mut self, input: &str, now: DateTime<Utc>) -> Option<TimerEvent> {
        self.end_time_input = input.to_string();
        let end_time = match parse_end_time(input) {
            Ok(end_time) => Some(end_time),
            Err(e) => {
                debug!("Ignoring end time: {}", e);
                None
            }
        };
        self.set_end_at(end_time, now)
    }

    /// Set or clear the end time directly and recompute
    pub fn set_end_at(
        &mut self,
        end_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<TimerEvent> {
        self.end_time = end_time;
        self.update(now)
    }

    /// Set the auto-start flag. Returns true when this started the timer.
    pub fn set_auto_start(&mut self, auto_start: bool) -> bool {
        self.auto_start = auto_start;
        if auto_start && !self.is_running {
            self.start();
            return true;
        }
        false
    }

    /// Recompute, redraw, and report the edge crossed by this update, if any.
    ///
    /// An unconfigured timer redraws as zero and never reports an edge.
    pub fn update(&mut self, now: DateTime<Utc>) -> Option<TimerEvent> {
        let data = self.current_time(now);

        if self.end_time.is_none() {
            self.render_text(&data);
            return None;
        }

        if data.is_expired {
            self.render_text(&data);
            if self.was_expired {
                return None;
            }
            self.was_expired = true;
            return Some(TimerEvent::Expired);
        }

        self.was_expired = false;

        let event = if data.is_critical && !self.was_critical {
            self.was_critical = true;
            Some(TimerEvent::Critical)
        } else {
            if !data.is_critical {
                self.was_critical = false;
            }
            None
        };

        let color = if data.is_critical {
            &self.critical_color
        } else {
            &self.text_color
        };
        self.display.set_color(color);
        self.render_text(&data);

        event
    }

    /// Snapshot at `now` without touching latches or the display
    pub fn current_time(&self, now: DateTime<Utc>) -> TimerData {
        compute_remaining(now, self.end_time, self.critical_threshold)
    }

    /// Whether a tick should advance this timer
    pub fn should_advance(&self) -> bool {
        self.is_running && !self.is_paused
    }

    /// Lifecycle phase derived from the flags and latches
    pub fn phase(&self) -> TimerPhase {
        if self.end_time.is_none() {
            TimerPhase::Idle
        } else if self.was_expired {
            TimerPhase::Expired
        } else if !self.is_running {
            TimerPhase::Stopped
        } else if self.is_paused {
            TimerPhase::Paused
        } else {
            TimerPhase::Running
        }
    }

    fn render_text(&mut self, data: &TimerData) {
        let text = format_time(
            data.days,
            data.hours,
            data.minutes,
            data.seconds,
            self.format,
            self.show_days,
            self.hide_zero_hours,
        );
        self.display.set_text(&text);
    }

    // Callbacks

    /// Replace the expiry handler, returning the previous one
    pub fn set_on_expired(&mut self, callback: Option<TimerCallback>) -> Option<TimerCallback> {
        std::mem::replace(&mut self.on_expired, callback)
    }

    /// Replace the critical handler, returning the previous one
    pub fn set_on_critical(&mut self, callback: Option<TimerCallback>) -> Option<TimerCallback> {
        std::mem::replace(&mut self.on_critical, callback)
    }

    /// Registered handler for an event
    pub fn handler(&self, event: TimerEvent) -> Option<TimerCallback> {
        match event {
            TimerEvent::Expired => self.on_expired.clone(),
            TimerEvent::Critical => self.on_critical.clone(),
        }
    }

    // Plain property setters

    /// Seconds remaining at which the timer turns critical
    pub fn set_critical_threshold(&mut self, seconds: f64) {
        self.critical_threshold = seconds;
    }

    /// Display pattern; unknown patterns fall back to `HH:MM:SS`
    pub fn set_format(&mut self, format: &str) {
        self.format = TimeFormat::from_pattern(format);
    }

    /// Whether the day field is shown when a day or more remains
    pub fn set_show_days(&mut self, show_days: bool) {
        self.show_days = show_days;
    }

    /// Whether zero hours are dropped from the display
    pub fn set_hide_zero_hours(&mut self, hide_zero_hours: bool) {
        self.hide_zero_hours = hide_zero_hours;
    }

    /// Color used outside the critical window
    pub fn set_text_color(&mut self, color: &str) {
        self.text_color = color.to_string();
    }

    /// Color used inside the critical window
    pub fn set_critical_color(&mut self, color: &str) {
        self.critical_color = color.to_string();
    }

    /// Skip ticks while the app is in the background
    pub fn set_pause_when_not_visible(&mut self, pause: bool) {
        self.pause_when_not_visible = pause;
    }

    /// Keep running when the app goes to the background
    pub fn set_continue_in_background(&mut self, continue_in_background: bool) {
        self.continue_in_background = continue_in_background;
    }

    // Getters

    /// Parsed end time, if any
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// End time exactly as last set, including unparseable input
    pub fn end_time_input(&self) -> &str {
        &self.end_time_input
    }

    /// Whether the timer has been started
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Whether ticks are currently ignored
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Expiry latch
    pub fn was_expired(&self) -> bool {
        self.was_expired
    }

    /// Critical latch
    pub fn was_critical(&self) -> bool {
        self.was_critical
    }

    /// Auto-start flag
    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    /// Critical threshold in seconds
    pub fn critical_threshold(&self) -> f64 {
        self.critical_threshold
    }

    /// Active display pattern
    pub fn format(&self) -> TimeFormat {
        self.format
    }

    /// Whether the day field may be shown
    pub fn show_days(&self) -> bool {
        self.show_days
    }

    /// Whether zero hours are hidden
    pub fn hide_zero_hours(&self) -> bool {
        self.hide_zero_hours
    }

    /// Normal text color
    pub fn text_color(&self) -> &str {
        &self.text_color
    }

    /// Critical text color
    pub fn critical_color(&self) -> &str {
        &self.critical_color
    }

    /// Whether ticks are skipped in the background
    pub fn pause_when_not_visible(&self) -> bool {
        self.pause_when_not_visible
    }

    /// Whether the timer keeps running in the background
    pub fn continue_in_background(&self) -> bool {
        self.continue_in_background
    }
}

impl fmt::Debug for TimerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerInstance")
            .field("end_time", &self.end_time)
            .field("is_running", &self.is_running)
            .field("is_paused", &self.is_paused)
            .field("was_expired", &self.was_expired)
            .field("was_critical", &self.was_critical)
            .field("auto_start", &self.auto_start)
            .field("critical_threshold", &self.critical_threshold)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::BufferedDisplay;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn instance() -> (TimerInstance, BufferedDisplay) {
        let display = BufferedDisplay::new();
        (TimerInstance::new(Box::new(display.clone())), display)
    }

    #[test]
    fn test_new_instance_is_idle_and_shows_zero() {
        let (timer, display) = instance();
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert!(!timer.should_advance());
        assert_eq!(display.text(), "00:00:00");
        assert_eq!(display.color(), None);
    }

    #[test]
    fn test_unconfigured_update_never_reports_expiry() {
        let (mut timer, _) = instance();
        for _ in 0..3 {
            assert_eq!(timer.update(base()), None);
        }
        assert!(!timer.was_expired());
        assert!(timer.current_time(base()).is_expired);
    }

    #[test]
    fn test_expiry_fires_once_per_edge() {
        let (mut timer, display) = instance();
        let now = base();
        timer.set_end_at(Some(now + Duration::seconds(2)), now);

        assert_eq!(timer.update(now + Duration::seconds(1)), None);
        assert_eq!(display.text(), "00:00:01");
        assert_eq!(timer.update(now + Duration::seconds(2)), Some(TimerEvent::Expired));
        assert_eq!(timer.update(now + Duration::seconds(3)), None);
        assert_eq!(timer.update(now + Duration::seconds(60)), None);
        assert_eq!(display.text(), "00:00:00");
        assert_eq!(timer.phase(), TimerPhase::Expired);
    }

    #[test]
    fn test_reset_rearms_expiry() {
        let (mut timer, _) = instance();
        let now = base();
        timer.set_end_at(Some(now - Duration::seconds(1)), now - Duration::seconds(5));

        assert_eq!(timer.update(now), Some(TimerEvent::Expired));
        assert_eq!(timer.update(now), None);

        // Reset recomputes immediately, so a still-elapsed timer re-expires at once.
        assert_eq!(timer.reset(now), Some(TimerEvent::Expired));
        assert_eq!(timer.update(now), None);
    }

    #[test]
    fn test_new_future_end_time_clears_expiry_latch() {
        let (mut timer, _) = instance();
        let now = base();
        timer.set_end_at(Some(now), now);
        assert!(timer.was_expired());

        assert_eq!(timer.set_end_at(Some(now + Duration::seconds(5)), now), Some(TimerEvent::Critical));
        assert!(!timer.was_expired());
        assert_eq!(timer.update(now + Duration::seconds(5)), Some(TimerEvent::Expired));
    }

    #[test]
    fn test_critical_fires_once_until_exited() {
        let (mut timer, display) = instance();
        let now = base();
        timer.set_critical_threshold(10.0);
        timer.set_end_at(Some(now + Duration::seconds(30)), now);
        assert_eq!(display.color().as_deref(), Some(DEFAULT_TEXT_COLOR));

        assert_eq!(timer.update(now + Duration::seconds(20)), Some(TimerEvent::Critical));
        assert_eq!(display.color().as_deref(), Some(DEFAULT_CRITICAL_COLOR));
        assert_eq!(timer.update(now + Duration::seconds(21)), None);

        // Leaving the critical window clears the latch silently.
        assert_eq!(timer.add_seconds(60.0, now + Duration::seconds(22)), None);
        assert!(!timer.was_critical());
        assert_eq!(display.color().as_deref(), Some(DEFAULT_TEXT_COLOR));

        assert_eq!(timer.update(now + Duration::seconds(80)), Some(TimerEvent::Critical));
    }

    #[test]
    fn test_critical_not_evaluated_once_expired() {
        let (mut timer, _) = instance();
        let now = base();
        timer.set_end_at(Some(now + Duration::seconds(100)), now - Duration::seconds(1000));
        assert_eq!(timer.update(now + Duration::seconds(100)), Some(TimerEvent::Expired));
        assert!(!timer.was_critical());
    }

    #[test]
    fn test_add_seconds_past_zero_reports_expired() {
        let (mut timer, _) = instance();
        let now = base();
        timer.set_critical_threshold(0.0);
        timer.set_end_at(Some(now + Duration::seconds(10)), now);

        assert_eq!(timer.add_seconds(-30.0, now), Some(TimerEvent::Expired));
        let data = timer.current_time(now);
        assert!(data.is_expired);
        assert_eq!(data.total_seconds, 0);
    }

    #[test]
    fn test_add_seconds_without_end_time_is_noop() {
        let (mut timer, display) = instance();
        let redraws = display.snapshot().redraws;
        assert_eq!(timer.add_seconds(30.0, base()), None);
        assert_eq!(timer.end_time(), None);
        assert_eq!(display.snapshot().redraws, redraws);
    }

    #[test]
    fn test_invalid_end_time_falls_back_to_idle() {
        let (mut timer, display) = instance();
        let now = base();
        timer.set_end_time("2024-05-01T12:10:00Z", now);
        assert_eq!(timer.end_time(), Some(now + Duration::minutes(10)));
        assert_eq!(display.text(), "00:10:00");

        assert_eq!(timer.set_end_time("not a date", now), None);
        assert_eq!(timer.end_time(), None);
        assert_eq!(timer.end_time_input(), "not a date");
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(display.text(), "00:00:00");
    }

    #[test]
    fn test_current_time_is_a_pure_read() {
        let (mut timer, display) = instance();
        let now = base();
        timer.set_end_at(Some(now + Duration::seconds(1)), now);
        let redraws = display.snapshot().redraws;

        let data = timer.current_time(now + Duration::seconds(5));
        assert!(data.is_expired);
        assert!(!timer.was_expired());
        assert_eq!(display.snapshot().redraws, redraws);
    }

    #[test]
    fn test_pause_and_resume_only_touch_paused_flag() {
        let (mut timer, _) = instance();
        timer.pause();
        assert!(!timer.is_running());
        assert!(timer.is_paused());

        timer.start();
        assert!(timer.should_advance());
        timer.pause();
        assert!(!timer.should_advance());
        assert!(timer.is_running());
        timer.resume();
        assert!(timer.should_advance());
    }

    #[test]
    fn test_auto_start_starts_only_when_stopped() {
        let (mut timer, _) = instance();
        assert!(!timer.set_auto_start(false));
        assert!(!timer.is_running());
        assert!(timer.set_auto_start(true));
        assert!(timer.is_running());
        assert!(!timer.set_auto_start(true));
    }

    #[test]
    fn test_format_settings_apply_on_next_redraw() {
        let (mut timer, display) = instance();
        let now = base();
        timer.set_format("Hh Mm Ss");
        timer.set_hide_zero_hours(true);
        timer.set_end_at(Some(now + Duration::seconds(309)), now);
        assert_eq!(display.text(), "5m 9s");

        timer.set_format("unknown");
        timer.update(now);
        assert_eq!(display.text(), "05:09");
        assert_eq!(timer.format(), TimeFormat::Padded);
    }

    #[test]
    fn test_props_deserialize_with_defaults() {
        let props: TimerProps =
            serde_json::from_str(r#"{"endTime":"2024-05-01T12:00:00Z","continueInBackground":false}"#)
                .unwrap();
        assert_eq!(props.end_time.as_deref(), Some("2024-05-01T12:00:00Z"));
        assert!(!props.continue_in_background);
        assert!(props.auto_start);
        assert_eq!(props.critical_threshold, 300.0);
        assert_eq!(props.format, "HH:MM:SS");
    }
}
