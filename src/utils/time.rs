//! Time utility functions
//!
//! Telemetry producers emit timestamps in several formats depending on the
//! exporting SDK: RFC 3339 strings, SQL-style `YYYY-MM-DD HH:MM:SS.ffffff`
//! strings, and integer epoch values of varying precision. Parsing is
//! lenient: an unrecognized value falls back to the Unix epoch with a
//! warning rather than failing the batch.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a raw timestamp string into `DateTime<Utc>`.
///
/// Accepted formats, in order:
/// 1. RFC 3339 / ISO 8601 (with offset or `Z`)
/// 2. Space-separated datetime with optional fractional seconds, assumed UTC
/// 3. Integer epoch value; precision inferred from magnitude
pub fn parse_timestamp(ts: &str) -> DateTime<Utc> {
    try_parse_timestamp(ts).unwrap_or_else(|| {
        tracing::warn!(ts, "Unparsable timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

fn try_parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }

    // SQL-style exports ("2024-01-15 10:30:00.123456"), no zone info
    if let Ok(naive) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    if let Ok(n) = ts.parse::<i64>() {
        return epoch_to_datetime(n);
    }

    None
}

/// Convert an integer epoch value to `DateTime<Utc>`, inferring the unit
/// (seconds, milliseconds, microseconds, or nanoseconds) from its magnitude.
///
/// The thresholds place the cutovers around the year 5138, far beyond any
/// plausible telemetry timestamp in the smaller unit.
pub fn epoch_to_datetime(n: i64) -> Option<DateTime<Utc>> {
    match n.unsigned_abs() {
        0..=99_999_999_999 => DateTime::from_timestamp(n, 0),
        100_000_000_000..=99_999_999_999_999 => DateTime::from_timestamp_millis(n),
        100_000_000_000_000..=99_999_999_999_999_999 => DateTime::from_timestamp_micros(n),
        _ => Some(DateTime::from_timestamp_nanos(n)),
    }
}

/// Format a timestamp as ISO 8601 with microsecond precision.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
