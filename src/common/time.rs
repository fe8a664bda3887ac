//! Time helpers shared by the evaluation loop and result metadata.
//!
//! Wall-clock stamps use `SystemTime`; interval measurement uses `Instant`.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Current timestamp in milliseconds since the Unix epoch.
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Seconds elapsed between two instants, saturating at zero.
pub fn seconds_between(earlier: Instant, later: Instant) -> f64 {
    later.saturating_duration_since(earlier).as_secs_f64()
}

/// Convert a duration in seconds to hours.
pub fn seconds_to_hours(secs: f64) -> f64 {
    secs / SECONDS_PER_HOUR
}

/// Whether `limit` has been reached since `start`.
pub fn limit_reached(start: Instant, limit: Option<Duration>) -> bool {
    limit.map_or(false, |max| start.elapsed() >= max)
}
