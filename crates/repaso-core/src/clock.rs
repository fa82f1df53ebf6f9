//! Injected time source.
//!
//! The weight model, day seeding, and dispatch gating all depend on "now"
//! and on the local calendar date. Both come from a [`Clock`] capability
//! passed in at the seams, so unit tests can pin time and assert exact
//! weights instead of relative comparisons.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveTime, Utc};

/// Time source used by the engine.
///
/// Implementors provide the current instant and the local UTC offset;
/// everything calendar-shaped is derived from those two.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Offset of the local timezone from UTC.
    fn local_offset(&self) -> FixedOffset;

    /// Current wall-clock time in the local timezone.
    fn now_local(&self) -> DateTime<FixedOffset> {
        self.now().with_timezone(&self.local_offset())
    }

    /// Local calendar date.
    fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }

    /// Local time of day.
    fn time_of_day(&self) -> NaiveTime {
        self.now_local().time()
    }

    /// Local calendar date a given instant falls on.
    fn local_date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.local_offset()).date_naive()
    }

    /// UTC instants bounding the current local calendar day: `[start, end)`.
    fn day_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let midnight = self.today().and_time(NaiveTime::MIN);
        let offset_secs = i64::from(self.local_offset().local_minus_utc());
        let start = DateTime::<Utc>::from_naive_utc_and_offset(
            midnight - Duration::seconds(offset_secs),
            Utc,
        );
        (start, start + Duration::days(1))
    }
}

/// Wall-clock implementation backed by the system timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_offset(&self) -> FixedOffset {
        *Local::now().offset()
    }
}

/// A clock pinned to a fixed instant, for tests.
///
/// Interior mutability lets tests sharing the clock through an `Arc`
/// move time forward mid-scenario.
#[derive(Debug)]
pub struct FixedClock {
    now: std::sync::Mutex<DateTime<Utc>>,
    offset: FixedOffset,
}

impl FixedClock {
    /// Pin the clock at `now` with the local timezone equal to UTC.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, FixedOffset::east_opt(0).expect("zero offset is valid"))
    }

    /// Pin the clock at `now` with an explicit local offset.
    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
            offset,
        }
    }

    /// Move the pinned instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock() = now;
    }

    /// Advance the pinned instant by a duration.
    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }

    fn local_offset(&self) -> FixedOffset {
        self.offset
    }
}
