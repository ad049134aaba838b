use crate::error::SpiderError;
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

/// Canonical layout of every date-valued column in `OptionQuotes`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a provider unix timestamp (seconds, UTC) to the canonical `YYYY-MM-DD HH:MM:SS` string.
///
/// Only four-digit years fit the layout; anything else is a transform error.
pub fn format_timestamp(timestamp: i64) -> Result<String, SpiderError> {
    DateTime::from_timestamp(timestamp, 0)
        .filter(|datetime| (0..=9999).contains(&datetime.year()))
        .map(format_datetime)
        .ok_or_else(|| SpiderError::transform(format!("timestamp {timestamp} is out of range")))
}

/// Inverse of [`format_timestamp`].
pub fn parse_timestamp(value: &str) -> Result<i64, SpiderError> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|err| SpiderError::transform(format!("invalid datetime \"{value}\", {err}")))
}

pub fn format_datetime(datetime: DateTime<Utc>) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}
