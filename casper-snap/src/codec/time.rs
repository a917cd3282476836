//! Timestamps and time-to-live values.
//!
//! Timestamps travel as RFC 3339 strings with millisecond precision and
//! are hashed as u64 milliseconds since the Unix epoch. TTLs use humantime
//! notation (`30m`, `1h 30m`, `1day`) and are hashed as u64 milliseconds.

use chrono::{DateTime, SecondsFormat, Utc};

use super::bytesrepr::CodecError;

/// Parses an RFC 3339 timestamp into Unix milliseconds.
pub fn parse_timestamp(s: &str) -> Result<u64, CodecError> {
    let dt = DateTime::parse_from_rfc3339(s)
        .map_err(|e| CodecError::InvalidJson(format!("bad timestamp {}: {}", s, e)))?;
    u64::try_from(dt.timestamp_millis())
        .map_err(|_| CodecError::InvalidJson(format!("timestamp before epoch: {}", s)))
}

/// Formats Unix milliseconds as RFC 3339 with millisecond precision.
pub fn format_timestamp(millis: u64) -> String {
    to_datetime(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| millis.to_string())
}

/// Formats Unix milliseconds for display, e.g. `2024-05-01 12:00:00 UTC`.
pub fn format_human(millis: u64) -> String {
    to_datetime(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn to_datetime(millis: u64) -> Option<DateTime<Utc>> {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

/// Parses a humantime duration into milliseconds.
///
/// Accepts one or more `<number><unit>` groups, optionally separated by
/// whitespace.
pub fn parse_ttl(s: &str) -> Result<u64, CodecError> {
    let duration = humantime::parse_duration(s)
        .map_err(|e| CodecError::InvalidJson(format!("bad ttl {}: {}", s, e)))?;
    u64::try_from(duration.as_millis())
        .map_err(|_| CodecError::InvalidJson(format!("ttl out of range: {}", s)))
}
