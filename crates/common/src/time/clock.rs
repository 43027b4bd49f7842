//! Clock abstraction for deterministic time-dependent logic

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Source of monotonic and wall-clock time
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Get milliseconds since UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        let millis = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        u64::try_from(millis).unwrap_or(u64::MAX)
    }

    /// Wall-clock time as a UTC timestamp
    fn utc_now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.system_time())
    }
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

/// Mock clock for deterministic testing
///
/// Monotonic and wall time advance together; clones share the same offset.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    wall_start: SystemTime,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock whose wall time starts at the UNIX epoch
    pub fn new() -> Self {
        Self::at(UNIX_EPOCH)
    }

    /// Create a mock clock whose wall time starts at `wall_start`
    pub fn at(wall_start: SystemTime) -> Self {
        Self { start: Instant::now(), wall_start, elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Create a mock clock starting at the given UTC timestamp
    pub fn at_utc(timestamp: DateTime<Utc>) -> Self {
        Self::at(SystemTime::from(timestamp))
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Get the current elapsed time
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        self.wall_start + self.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    /// Validates the system clock now scenario.
    ///
    /// Assertions:
    /// - Ensures `now2 >= now1` evaluates to true.
    #[test]
    fn test_system_clock_now() {
        let clock = SystemClock;
        let now1 = clock.now();
        let now2 = clock.now();
        assert!(now2 >= now1, "System clock should advance");
        assert!(clock.system_time() > UNIX_EPOCH);
    }

    /// Validates `MockClock::advance` for both time sources.
    ///
    /// Assertions:
    /// - Confirms monotonic and wall time move by the same amount.
    /// - Confirms clones observe the advance.
    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::new();
        let shared = clock.clone();
        let start = clock.now();

        clock.advance(Duration::from_secs(5));

        assert_eq!(shared.now().duration_since(start), Duration::from_secs(5));
        assert_eq!(shared.millis_since_epoch(), 5_000);
    }

    #[test]
    fn test_mock_clock_at_utc() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).single().expect("valid timestamp");
        let clock = MockClock::at_utc(ts);
        clock.advance(Duration::from_secs(60));

        assert_eq!(clock.utc_now(), ts + chrono::Duration::minutes(1));
    }
}
