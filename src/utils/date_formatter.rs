use chrono::{DateTime, TimeZone, Timelike};
use chrono_tz::Tz;

/// Granularity used to format time ticks, picked from the visible x span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateDisplayUnit {
    Default,      // 2024-01-12
    Minutes,      // 10:30
    Seconds,      // 10:30:15
    Milliseconds, // 10:30:15:250
}

impl DateDisplayUnit {
    pub fn date_format(&self) -> &'static str {
        match self {
            Self::Default => "%Y-%m-%d",
            Self::Minutes => "%H:%M",
            Self::Seconds => "%H:%M:%S",
            Self::Milliseconds => "%H:%M:%S:%3f",
        }
    }

    /// Format of the date shared by every tick, when ticks only show the time of day.
    pub fn main_date_format(&self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            _ => Some("%Y-%m-%d"),
        }
    }
}

/// Display unit plus the formatted shared date, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedDateDisplay {
    pub unit: DateDisplayUnit,
    pub formatted_main_date: Option<String>,
}

fn to_datetime(timestamp_ms: f64, tz: Tz) -> Option<DateTime<Tz>> {
    if !timestamp_ms.is_finite() {
        return None;
    }
    match tz.timestamp_millis_opt(timestamp_ms as i64) {
        chrono::LocalResult::Single(d) => Some(d),
        chrono::LocalResult::Ambiguous(d, _) => Some(d),
        chrono::LocalResult::None => None,
    }
}

/// Picks the unit for the interval `[min_ms, max_ms]`:
/// different days show dates, same day shows minutes, same minute shows seconds,
/// same second shows milliseconds.
pub fn date_display_unit(min_ms: f64, max_ms: f64, tz: Tz) -> DateDisplayUnit {
    let (Some(min), Some(max)) = (to_datetime(min_ms, tz), to_datetime(max_ms, tz)) else {
        return DateDisplayUnit::Default;
    };
    if min.date_naive() != max.date_naive() {
        DateDisplayUnit::Default
    } else if min.hour() != max.hour() || min.minute() != max.minute() {
        DateDisplayUnit::Minutes
    } else if min.second() != max.second() {
        DateDisplayUnit::Seconds
    } else {
        DateDisplayUnit::Milliseconds
    }
}

pub fn compute_date_display(min_ms: f64, max_ms: f64, tz: Tz) -> ComputedDateDisplay {
    let unit = date_display_unit(min_ms, max_ms, tz);
    let formatted_main_date = unit
        .main_date_format()
        .map(|fmt| format_timestamp(min_ms, fmt, tz));
    ComputedDateDisplay {
        unit,
        formatted_main_date,
    }
}

/// Formats a millisecond timestamp with a chrono format string.
pub fn format_timestamp(timestamp_ms: f64, format: &str, tz: Tz) -> String {
    match to_datetime(timestamp_ms, tz) {
        Some(dt) => dt.format(format).to_string(),
        None => format!("{:.2}", timestamp_ms),
    }
}
