use chrono::{DateTime, FixedOffset, Local};

/// Source of "now" for period math.
///
/// The instant carries the caller's UTC offset: period boundaries are local
/// calendar days/weeks/months, so "now" must know where the caller is. Tests
/// freeze it with [`FixedClock`]; production code uses [`SystemClock`], which
/// reports device-local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always reports the same instant (and offset).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
