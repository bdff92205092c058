//! Millisecond-precision event-time model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A point in event or processing time, in milliseconds since the Unix epoch.
///
/// The representable range is clamped well inside `i64` so that arithmetic
/// with [`Duration`] saturates instead of wrapping.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Instant(i64);

impl Instant {
    /// The minimum representable timestamp; used as the "no watermark yet"
    /// sentinel.
    pub const MIN: Instant = Instant(-9_223_372_036_854_775);

    /// The maximum representable timestamp.
    pub const MAX: Instant = Instant(9_223_372_036_854_775);

    /// The end of the global window: one day before [`Instant::MAX`] so GC
    /// holds can still be scheduled after it.
    pub const END_OF_GLOBAL_WINDOW: Instant = Instant(Instant::MAX.0 - 86_400_000);

    pub const fn from_millis(millis: i64) -> Self {
        Instant(millis)
    }

    pub const fn millis(self) -> i64 {
        self.0
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let elapsed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        Instant(elapsed.as_millis() as i64)
    }

    pub fn is_after(self, other: Instant) -> bool {
        self > other
    }

    pub fn is_before(self, other: Instant) -> bool {
        self < other
    }

    pub fn saturating_add(self, duration: Duration) -> Instant {
        let millis = self
            .0
            .checked_add(duration.millis())
            .unwrap_or(if duration.millis() < 0 { i64::MIN } else { i64::MAX });
        Instant(millis.clamp(Self::MIN.0, Self::MAX.0))
    }
}

impl fmt::Debug for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instant({}ms)", self.0)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        self.saturating_add(rhs)
    }
}

impl Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, rhs: Duration) -> Instant {
        self.saturating_add(Duration::from_millis(-rhs.millis()))
    }
}

/// A span of time in milliseconds. May be negative.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Duration(i64);

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub const fn from_millis(millis: i64) -> Self {
        Duration(millis)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Duration(secs * 1000)
    }

    pub const fn millis(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({}ms)", self.0)
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0.saturating_sub(rhs.0))
    }
}
