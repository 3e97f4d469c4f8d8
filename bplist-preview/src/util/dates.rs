/*!
 Contains date conversion helpers for Apple's reference date.
*/

use chrono::{DateTime, SecondsFormat, Utc};

/// Milliseconds between the Unix epoch and 2001-01-01T00:00:00Z, Apple's reference date
pub const APPLE_EPOCH_MILLIS: i64 = 978_307_200_000;
/// The widest timestamp, in milliseconds from the Unix epoch, that is treated as a valid date
const MAX_TIMESTAMP_MILLIS: f64 = 8.64e15;

/// Convert seconds since Apple's reference date into an ISO-8601 UTC timestamp with
/// millisecond precision, i.e. `2001-01-01T00:00:00.000Z`
///
/// Returns [`None`] if the value is not finite or is outside of the representable range.
pub fn apple_seconds_to_iso8601(seconds: f64) -> Option<String> {
    let millis = seconds * 1000.0 + APPLE_EPOCH_MILLIS as f64;
    if !millis.is_finite() || millis.abs() > MAX_TIMESTAMP_MILLIS {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis.trunc() as i64)
        .map(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true))
}
