//! Ride duration calculation.

use chrono::{NaiveDateTime, TimeZone};
use chrono_tz::Europe::London;
use chrono_tz::Tz;

/// Minute-precision local wall-clock format used by the results exports.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Calculate whole hours and remainder minutes between two timestamps.
///
/// Both timestamps are wall-clock times in the Europe/London zone. If
/// either fails to parse (or names a nonexistent local time), the result
/// is (0, 0) rather than an error. Hours are truncated toward zero;
/// negative durations propagate as given.
pub fn ride_length(start_time: &str, finish_time: &str) -> (i64, i64) {
    let st = match local_time(start_time) {
        Some(t) => t,
        None => return (0, 0),
    };
    let ft = match local_time(finish_time) {
        Some(t) => t,
        None => return (0, 0),
    };

    let elapsed = ft.signed_duration_since(st);
    let hours = elapsed.num_hours();
    let mins = elapsed.num_minutes() - hours * 60;

    (hours, mins)
}

fn local_time(value: &str) -> Option<chrono::DateTime<Tz>> {
    let naive = match NaiveDateTime::parse_from_str(value, TIME_FORMAT) {
        Ok(t) => t,
        Err(_) => return None,
    };

    // An ambiguous wall-clock time (autumn DST overlap) resolves to its
    // earlier occurrence; a nonexistent one (spring gap) is a parse failure.
    London.from_local_datetime(&naive).earliest()
}
