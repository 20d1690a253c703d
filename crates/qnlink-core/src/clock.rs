//! Wall-clock access
//!
//! Everything that reads "now" goes through [`Clock`] so callers can pin
//! time in tests.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};

#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Current time, with the offset of the clock's zone
    fn now(&self) -> DateTime<FixedOffset>;

    /// Wall time of `instant` in the clock's zone
    fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime;

    /// 1970-01-01T00:00:00Z expressed as wall time in the clock's zone
    fn epoch_base(&self) -> NaiveDateTime {
        self.to_local(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// System clock in the local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl Clock for WallClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let local_time_now = Local::now();
        local_time_now.with_timezone(local_time_now.offset())
    }

    fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&Local).naive_local()
    }
}

/// Clock frozen at a given instant, living in that instant's offset
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    /// Clock at `secs` past the Unix epoch in UTC
    pub fn from_unix(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(|utc| Self::new(utc.fixed_offset()))
    }

    pub fn set(&mut self, now: DateTime<FixedOffset>) {
        self.now = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }

    fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(self.now.offset()).naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_epoch_base_follows_offset() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let clock = FixedClock::new(offset.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap());

        assert_eq!(clock.epoch_base().to_string(), "1970-01-01 08:00:00");
    }

    #[test]
    fn test_fixed_clock_from_unix() {
        let clock = FixedClock::from_unix(1_500_000_000).unwrap();
        assert_eq!(clock.now().timestamp(), 1_500_000_000);
        assert_eq!(clock.epoch_base().to_string(), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_wall_clock_epoch_base_is_local_epoch() {
        let clock = WallClock;
        let expected = Local.timestamp_opt(0, 0).unwrap().naive_local();
        assert_eq!(clock.epoch_base(), expected);
    }
}
