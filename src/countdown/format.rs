//! Display formatting for remaining-time components

/// Display pattern selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    /// `HH:MM:SS`, zero padded
    #[default]
    Padded,
    /// `H:M:S`
    Compact,
    /// `Hh Mm Ss`
    Units,
    /// `H hours M minutes`
    Words,
}

impl TimeFormat {
    /// Resolve a format string. Unknown strings fall back to `HH:MM:SS`.
    pub fn from_pattern(pattern: &str) -> Self {
        match pattern {
            "H:M:S" => Self::Compact,
            "Hh Mm Ss" => Self::Units,
            "H hours M minutes" => Self::Words,
            _ => Self::Padded,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Padded => "HH:MM:SS",
            Self::Compact => "H:M:S",
            Self::Units => "Hh Mm Ss",
            Self::Words => "H hours M minutes",
        }
    }
}

impl From<&str> for TimeFormat {
    fn from(pattern: &str) -> Self {
        Self::from_pattern(pattern)
    }
}

/// Render remaining-time components.
///
/// The days layout wins when `show_days` is set and there is at least one day
/// left; otherwise the minutes-only layout applies when `hide_zero_hours` is
/// set and the hour component is zero.
pub fn format_time(
    days: u64,
    hours: u64,
    minutes: u64,
    seconds: u64,
    format: TimeFormat,
    show_days: bool,
    hide_zero_hours: bool,
) -> String {
    let with_days = show_days && days > 0;
    let minutes_only = !with_days && hide_zero_hours && hours == 0;

    match format {
        TimeFormat::Padded if with_days => {
            format!("{}:{:02}:{:02}:{:02}", days, hours, minutes, seconds)
        }
        TimeFormat::Padded if minutes_only => format!("{:02}:{:02}", minutes, seconds),
        TimeFormat::Padded => format!("{:02}:{:02}:{:02}", hours, minutes, seconds),

        TimeFormat::Compact if with_days => format!("{}:{}:{}:{}", days, hours, minutes, seconds),
        TimeFormat::Compact if minutes_only => format!("{}:{}", minutes, seconds),
        TimeFormat::Compact => format!("{}:{}:{}", hours, minutes, seconds),

        TimeFormat::Units if with_days => {
            format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
        }
        TimeFormat::Units if minutes_only => format!("{}m {}s", minutes, seconds),
        TimeFormat::Units => format!("{}h {}m {}s", hours, minutes, seconds),

        TimeFormat::Words if with_days => {
            format!("{} days {} hours {} minutes", days, hours, minutes)
        }
        TimeFormat::Words if minutes_only => format!("{} minutes", minutes),
        TimeFormat::Words => format!("{} hours {} minutes", hours, minutes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_layouts() {
        let f = TimeFormat::Padded;
        assert_eq!(format_time(1, 2, 3, 4, f, true, false), "1:02:03:04");
        assert_eq!(format_time(0, 0, 5, 9, f, true, true), "05:09");
        assert_eq!(format_time(0, 2, 3, 4, f, true, true), "02:03:04");
        assert_eq!(format_time(0, 0, 0, 0, f, true, false), "00:00:00");
    }

    #[test]
    fn test_days_hidden_when_show_days_is_off() {
        // Days are dropped from the output, not folded into hours.
        assert_eq!(format_time(3, 4, 5, 6, TimeFormat::Padded, false, false), "04:05:06");
        assert_eq!(format_time(3, 0, 5, 6, TimeFormat::Padded, false, true), "05:06");
    }

    #[test]
    fn test_compact_layouts() {
        let f = TimeFormat::Compact;
        assert_eq!(format_time(1, 2, 3, 4, f, true, false), "1:2:3:4");
        assert_eq!(format_time(0, 0, 3, 4, f, true, true), "3:4");
        assert_eq!(format_time(0, 7, 3, 4, f, true, true), "7:3:4");
    }

    #[test]
    fn test_units_layouts() {
        let f = TimeFormat::Units;
        assert_eq!(format_time(1, 2, 3, 4, f, true, false), "1d 2h 3m 4s");
        assert_eq!(format_time(0, 0, 5, 9, f, true, true), "5m 9s");
        assert_eq!(format_time(0, 0, 5, 9, f, true, false), "0h 5m 9s");
    }

    #[test]
    fn test_words_layouts_drop_seconds() {
        let f = TimeFormat::Words;
        assert_eq!(format_time(2, 1, 30, 59, f, true, false), "2 days 1 hours 30 minutes");
        assert_eq!(format_time(0, 0, 30, 59, f, true, true), "30 minutes");
        assert_eq!(format_time(0, 5, 30, 59, f, false, true), "5 hours 30 minutes");
    }

    #[test]
    fn test_days_branch_takes_precedence() {
        assert_eq!(format_time(1, 0, 0, 1, TimeFormat::Units, true, true), "1d 0h 0m 1s");
    }

    #[test]
    fn test_unknown_format_falls_back_to_padded() {
        let f = TimeFormat::from_pattern("MM-SS please");
        assert_eq!(f, TimeFormat::Padded);
        assert_eq!(format_time(0, 1, 2, 3, f, true, false), "01:02:03");
    }

    #[test]
    fn test_format_pattern_round_trip() {
        for f in [
            TimeFormat::Padded,
            TimeFormat::Compact,
            TimeFormat::Units,
            TimeFormat::Words,
        ] {
            assert_eq!(TimeFormat::from(f.as_str()), f);
        }
    }
}
