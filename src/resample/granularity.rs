//! Time bucket granularities
//!
//! The ladder of fixed granularities used for temporal dimensions, with
//! truncation to bucket start, label formatting and the automatic choice
//! of a granularity for a given timestamp span.
//!
//! All arithmetic is in UTC on Unix milliseconds. Weeks start on Monday.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use serde::{Deserialize, Serialize};

/// Fixed time granularities, finest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Hour,
    Day,
    /// Starts on Monday
    Week,
    /// Calendar month
    Month,
    /// Calendar quarter (Jan, Apr, Jul, Oct)
    Quarter,
    Year,
}

impl TimeBucket {
    /// The granularity ladder walked by [`TimeBucket::auto_for_span`]
    pub const LADDER: [TimeBucket; 6] = [
        TimeBucket::Hour,
        TimeBucket::Day,
        TimeBucket::Week,
        TimeBucket::Month,
        TimeBucket::Quarter,
        TimeBucket::Year,
    ];

    /// Granularity used when there is no span to measure
    pub const DEFAULT: TimeBucket = TimeBucket::Day;

    /// Truncate a timestamp to the start of its bucket
    ///
    /// # Arguments
    /// * `timestamp` - Unix timestamp in milliseconds
    ///
    /// # Returns
    /// The bucket start in milliseconds; out-of-range input is returned as-is
    pub fn truncate(&self, timestamp: i64) -> i64 {
        let dt = match Utc.timestamp_millis_opt(timestamp) {
            LocalResult::Single(dt) => dt,
            _ => return timestamp,
        };

        if *self == Self::Hour {
            return dt
                .with_minute(0)
                .and_then(|d| d.with_second(0))
                .and_then(|d| d.with_nanosecond(0))
                .map(|d| d.timestamp_millis())
                .unwrap_or(timestamp);
        }

        let date = dt.date_naive();
        let start = match self {
            Self::Hour | Self::Day => Some(date),
            Self::Week => {
                let days_since_monday = date.weekday().num_days_from_monday() as i64;
                date.checked_sub_signed(Duration::days(days_since_monday))
            }
            Self::Month => date.with_day(1),
            Self::Quarter => NaiveDate::from_ymd_opt(date.year(), quarter_start(date.month()), 1),
            Self::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        };

        start
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc().timestamp_millis())
            .unwrap_or(timestamp)
    }

    /// Human-readable label for a bucket start
    pub fn label(&self, bucket_start: i64) -> String {
        let dt = match Utc.timestamp_millis_opt(bucket_start) {
            LocalResult::Single(dt) => dt,
            _ => return bucket_start.to_string(),
        };

        match self {
            Self::Hour => dt.format("%Y-%m-%d %H:00").to_string(),
            Self::Day => dt.format("%Y-%m-%d").to_string(),
            Self::Week => dt.format("%G-W%V").to_string(),
            Self::Month => dt.format("%Y-%m").to_string(),
            Self::Quarter => format!("{}-Q{}", dt.year(), (dt.month() - 1) / 3 + 1),
            Self::Year => dt.format("%Y").to_string(),
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hour" | "hourly" | "h" => Some(Self::Hour),
            "day" | "daily" | "d" => Some(Self::Day),
            "week" | "weekly" | "w" => Some(Self::Week),
            "month" | "monthly" | "m" => Some(Self::Month),
            "quarter" | "quarterly" | "q" => Some(Self::Quarter),
            "year" | "yearly" | "y" => Some(Self::Year),
            _ => None,
        }
    }

    /// Get the duration in milliseconds (approximate for variable intervals)
    pub fn approx_duration_ms(&self) -> i64 {
        const HOUR: i64 = 3600 * 1000;
        const DAY: i64 = 24 * HOUR;
        match self {
            Self::Hour => HOUR,
            Self::Day => DAY,
            Self::Week => 7 * DAY,
            Self::Month => 30 * DAY,
            Self::Quarter => 91 * DAY,
            Self::Year => 365 * DAY,
        }
    }

    /// Pick a granularity so that `span_ms` splits into at most about
    /// `target_buckets` buckets
    ///
    /// The slot width `span / target` is rounded up to the first ladder step
    /// at least that wide; spans wider than `target` years resolve to `Year`.
    pub fn auto_for_span(span_ms: i64, target_buckets: usize) -> Self {
        if span_ms <= 0 {
            return Self::DEFAULT;
        }

        let target = target_buckets.max(1) as i64;
        let slot = span_ms / target + i64::from(span_ms % target != 0);

        Self::LADDER
            .iter()
            .copied()
            .find(|g| g.approx_duration_ms() >= slot)
            .unwrap_or(Self::Year)
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hour => write!(f, "hour"),
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Quarter => write!(f, "quarter"),
            Self::Year => write!(f, "year"),
        }
    }
}

fn quarter_start(month: u32) -> u32 {
    (month - 1) / 3 * 3 + 1
}

/// Parse an ISO-ish timestamp into Unix milliseconds
///
/// Accepts RFC 3339, naive date-times (taken as UTC) and plain dates
/// (midnight UTC). Returns `None` for anything else.
pub fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).timestamp_millis());
    }

    const DATE_TIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis());
        }
    }

    None
}
