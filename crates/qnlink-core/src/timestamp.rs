//! Conversions between points in time and Unix timestamps
//!
//! The epoch base is 1970-01-01T00:00:00Z rendered as wall time in the
//! clock's zone, and differences are taken between wall times. Across a
//! daylight-saving change this differs from the true UTC-based Unix time by
//! the offset change. Verifying servers depend on this arithmetic, so it
//! must not be switched to plain UTC.

use crate::clock::Clock;
use crate::error::QnlinkError;
use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone, Utc};
use qnlink_types::Timestamp;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Timestamp of the moment `seconds_after_now` seconds from now.
///
/// Negative values are accepted and yield a timestamp in the past.
pub fn expire_after<C: Clock + ?Sized>(clock: &C, seconds_after_now: i64) -> Timestamp {
    let elapsed = clock.now().naive_local() - clock.epoch_base();
    truncate_secs(to_nanos(elapsed) + i128::from(seconds_after_now) * NANOS_PER_SEC)
}

/// Timestamp of a wall time in the clock's zone
pub fn to_timestamp<C: Clock + ?Sized>(clock: &C, local: NaiveDateTime) -> Timestamp {
    truncate_secs(to_nanos(local - clock.epoch_base()))
}

/// Timestamp of an instant given in any zone
pub fn datetime_to_timestamp<C, Tz>(clock: &C, instant: &DateTime<Tz>) -> Timestamp
where
    C: Clock + ?Sized,
    Tz: TimeZone,
{
    to_timestamp(clock, clock.to_local(instant.with_timezone(&Utc)))
}

/// Wall time in the clock's zone for `timestamp`
pub fn from_timestamp<C: Clock + ?Sized>(
    clock: &C,
    timestamp: Timestamp,
) -> Result<NaiveDateTime, QnlinkError> {
    let secs = timestamp.as_secs();
    TimeDelta::try_seconds(secs)
        .and_then(|delta| clock.epoch_base().checked_add_signed(delta))
        .ok_or(QnlinkError::TimestampOutOfRange(secs))
}

/// Like [`from_timestamp`], for the string form carried in URLs
pub fn from_timestamp_str<C: Clock + ?Sized>(
    clock: &C,
    timestamp: &str,
) -> Result<NaiveDateTime, QnlinkError> {
    from_timestamp(clock, timestamp.parse()?)
}

fn to_nanos(delta: TimeDelta) -> i128 {
    i128::from(delta.num_seconds()) * NANOS_PER_SEC + i128::from(delta.subsec_nanos())
}

// Integer division truncates toward zero, dropping sub-second precision.
fn truncate_secs(nanos: i128) -> Timestamp {
    let secs = nanos / NANOS_PER_SEC;
    Timestamp::from_secs(secs.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
}
