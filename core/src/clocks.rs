// Snippets
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Collection of clock implementations.

use async_trait::async_trait;
use std::time::Duration;
use time::OffsetDateTime;

/// Generic definition of a clock.
#[async_trait]
pub trait Clock {
    /// Returns the current UTC time.
    fn now_utc(&self) -> OffsetDateTime;

    /// Pauses execution of the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Clock implementation that uses the system clock.
#[derive(Clone, Default)]
pub struct SystemClock {}

#[async_trait]
impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();

        // Truncate the timestamp to microsecond resolution so that values survive a round trip
        // through the database unchanged and compare equal afterwards.
        let micros = now.nanosecond() / 1000 * 1000;
        now.replace_nanosecond(micros).unwrap_or(now)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// Test utilities.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Converts `ts` to microseconds since the epoch, rejecting sub-microsecond precision.
    fn to_micros(ts: OffsetDateTime) -> u64 {
        let ns = ts.unix_timestamp_nanos();
        assert!(ns % 1000 == 0, "Nanosecond precision not supported");
        u64::try_from(ns / 1000).expect("Test timestamps must be after the epoch")
    }

    /// Converts `us` microseconds since the epoch to a timestamp.
    fn from_micros(us: u64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(us) * 1000).unwrap()
    }

    /// Creates a UTC timestamp from its parts, which must be valid.
    pub fn utc_datetime(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> OffsetDateTime {
        let month = time::Month::try_from(month).unwrap();
        let date = time::Date::from_calendar_date(year, month, day).unwrap();
        let time = time::Time::from_hms(hour, minute, second).unwrap();
        date.with_time(time).assume_utc()
    }

    /// A clock that returns a preconfigured instant and that can be modified at will.
    ///
    /// Only supports microsecond-level precision.
    pub struct SettableClock {
        /// Current fake time in microseconds.
        now_us: AtomicU64,
    }

    impl SettableClock {
        /// Creates a new clock that returns `now` until reconfigured with `set`.
        pub fn new(now: OffsetDateTime) -> Self {
            Self { now_us: AtomicU64::new(to_micros(now)) }
        }

        /// Sets the new value of `now` that the clock returns.
        pub fn set(&self, now: OffsetDateTime) {
            self.now_us.store(to_micros(now), Ordering::SeqCst);
        }

        /// Advances the current time by `delta`.
        pub fn advance(&self, delta: Duration) {
            let delta_us = u64::try_from(delta.as_micros()).unwrap();
            assert!(delta.subsec_nanos() % 1000 == 0, "Nanosecond precision not supported");
            self.now_us.fetch_add(delta_us, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Clock for SettableClock {
        fn now_utc(&self) -> OffsetDateTime {
            from_micros(self.now_us.load(Ordering::SeqCst))
        }

        async fn sleep(&self, duration: Duration) {
            self.advance(duration);
            tokio::task::yield_now().await;
        }
    }

    /// A clock that advances by one second every time it is queried.
    ///
    /// Useful to obtain distinct and strictly increasing timestamps for entities created in quick
    /// succession, such as snippets whose listing order depends on their creation time.
    pub struct MonotonicClock {
        /// Time to return on the next query, in microseconds.
        next_us: AtomicU64,
    }

    impl MonotonicClock {
        /// Creates a new clock whose first reading is `start_secs` seconds after the epoch.
        pub fn new(start_secs: u64) -> Self {
            Self { next_us: AtomicU64::new(start_secs * 1_000_000) }
        }
    }

    #[async_trait]
    impl Clock for MonotonicClock {
        fn now_utc(&self) -> OffsetDateTime {
            from_micros(self.next_us.fetch_add(1_000_000, Ordering::SeqCst))
        }

        async fn sleep(&self, duration: Duration) {
            let delta_us = u64::try_from(duration.as_micros()).unwrap();
            self.next_us.fetch_add(delta_us, Ordering::SeqCst);
            tokio::task::yield_now().await;
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::panic::catch_unwind;
        use time::macros::datetime;

        #[test]
        fn test_utc_datetime() {
            assert_eq!(datetime!(2023-11-04 09:05:59 UTC), utc_datetime(2023, 11, 4, 9, 5, 59));
        }

        #[test]
        fn test_settableclock_microsecond_precision_supported() {
            let now = datetime!(2023-12-01 10:15:00.123456 UTC);
            let clock = SettableClock::new(now);
            assert_eq!(now, clock.now_utc());

            let now = datetime!(2023-12-01 10:15:00.987654 UTC);
            clock.set(now);
            assert_eq!(now, clock.now_utc());

            clock.advance(Duration::from_micros(1));
            assert_eq!(datetime!(2023-12-01 10:15:00.987655 UTC), clock.now_utc());
        }

        #[test]
        fn test_settableclock_nanosecond_precision_unsupported() {
            catch_unwind(|| {
                SettableClock::new(datetime!(2023-12-01 10:20:00.123456001 UTC));
            })
            .unwrap_err();

            let clock = SettableClock::new(datetime!(2023-12-01 10:20:00 UTC));
            catch_unwind(|| {
                clock.advance(Duration::from_nanos(1));
            })
            .unwrap_err();
        }

        #[tokio::test]
        async fn test_settableclock_sleep_advances_time() {
            let clock = SettableClock::new(datetime!(2023-12-01 10:40:00 UTC));
            clock.sleep(Duration::from_secs(3600)).await;
            assert_eq!(datetime!(2023-12-01 11:40:00 UTC), clock.now_utc());
        }

        #[test]
        fn test_monotonicclock_advances_on_every_query() {
            let clock = MonotonicClock::new(100000);
            let first = clock.now_utc();
            let second = clock.now_utc();
            assert_eq!(100000, first.unix_timestamp());
            assert_eq!(first + Duration::from_secs(1), second);
        }

        #[tokio::test]
        async fn test_monotonicclock_sleep_advances_time() {
            let clock = MonotonicClock::new(100);
            clock.sleep(Duration::from_secs(50)).await;
            assert_eq!(150, clock.now_utc().unix_timestamp());
        }
    }
}
