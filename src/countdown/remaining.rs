//! Remaining-time computation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimerError;

const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Snapshot of a countdown at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerData {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub total_seconds: u64,
    pub is_expired: bool,
    pub is_critical: bool,
}

impl TimerData {
    /// All-zero snapshot used for both unconfigured and elapsed timers
    pub fn expired() -> Self {
        Self {
            is_expired: true,
            ..Self::default()
        }
    }
}

/// Compute the remaining time between `now` and `end_time`.
///
/// A missing end time reads as expired. Components are derived from the
/// remaining seconds truncated toward zero, while the critical check uses the
/// fractional value so that a threshold of `10.0` turns critical exactly when
/// ten seconds remain.
pub fn compute_remaining(
    now: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    critical_threshold: f64,
) -> TimerData {
    let Some(end_time) = end_time else {
        return TimerData::expired();
    };

    let remaining = remaining_seconds(now, end_time);
    if remaining <= 0.0 {
        return TimerData::expired();
    }

    let total = remaining.trunc() as u64;
    TimerData {
        days: total / SECONDS_PER_DAY,
        hours: (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
        minutes: (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
        seconds: total % SECONDS_PER_MINUTE,
        total_seconds: total,
        is_expired: false,
        is_critical: remaining <= critical_threshold,
    }
}

fn remaining_seconds(now: DateTime<Utc>, end_time: DateTime<Utc>) -> f64 {
    (end_time - now).num_milliseconds() as f64 / 1000.0
}

/// Parse an ISO-8601 / RFC 3339 timestamp and normalize it to UTC
pub fn parse_end_time(input: &str) -> Result<DateTime<Utc>, TimerError> {
    DateTime::parse_from_rfc3339(input.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| TimerError::InvalidEndTime {
            input: input.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_future_end_time_decomposes() {
        let now = base();
        let end = now + Duration::milliseconds(((2 * 86_400 + 3_723) * 1000) + 900);

        let data = compute_remaining(now, Some(end), 300.0);
        assert!(!data.is_expired);
        assert!(!data.is_critical);
        assert_eq!(data.total_seconds, 2 * 86_400 + 3_723);
        assert_eq!(data.days, 2);
        assert_eq!(data.hours, 1);
        assert_eq!(data.minutes, 2);
        assert_eq!(data.seconds, 3);
    }

    #[test]
    fn test_total_seconds_is_truncated() {
        let now = base();
        for millis in [1_001, 59_999, 3_600_500] {
            let end = now + Duration::milliseconds(millis);
            let data = compute_remaining(now, Some(end), 0.0);
            assert!(!data.is_expired);
            assert_eq!(data.total_seconds, (millis / 1000) as u64);
        }
    }

    #[test]
    fn test_past_or_equal_end_time_is_expired() {
        let now = base();
        for end in [now, now - Duration::seconds(1), now - Duration::days(3)] {
            assert_eq!(compute_remaining(now, Some(end), 300.0), TimerData::expired());
        }
    }

    #[test]
    fn test_missing_end_time_is_expired_not_critical() {
        let data = compute_remaining(base(), None, 1e9);
        assert!(data.is_expired);
        assert!(!data.is_critical);
        assert_eq!(data.total_seconds, 0);
    }

    #[test]
    fn test_critical_threshold_is_inclusive() {
        let now = base();
        let at_threshold = compute_remaining(now, Some(now + Duration::seconds(10)), 10.0);
        assert!(at_threshold.is_critical);

        let above = compute_remaining(now, Some(now + Duration::milliseconds(10_001)), 10.0);
        assert!(!above.is_critical);
    }

    #[test]
    fn test_sub_second_remaining_is_not_expired() {
        let now = base();
        let data = compute_remaining(now, Some(now + Duration::milliseconds(400)), 300.0);
        assert!(!data.is_expired);
        assert!(data.is_critical);
        assert_eq!(data.total_seconds, 0);
    }

    #[test]
    fn test_parse_end_time() {
        assert_eq!(parse_end_time("2024-05-01T12:00:00Z").unwrap(), base());
        assert_eq!(parse_end_time("2024-05-01T14:00:00+02:00").unwrap(), base());
        assert!(parse_end_time("2024-05-01T12:00:00.250Z").is_ok());
        assert!(parse_end_time("tomorrow").is_err());
        assert!(parse_end_time("").is_err());
    }
}
