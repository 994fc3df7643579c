//! Wall-clock helpers.
//!
//! Every timestamp in the system is Unix milliseconds. Core operations take
//! `now` as an argument instead of reading the clock, so only the transport
//! layer calls [`now_millis`].

use chrono::Utc;
use gridwall_types::Timestamp;

/// Milliseconds in one second.
const MILLIS_PER_SECOND: Timestamp = 1000;

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// `floor(timestamp / 1000)`, rounding toward negative infinity.
pub const fn second_of(timestamp: Timestamp) -> i64 {
    timestamp.div_euclid(MILLIS_PER_SECOND)
}
