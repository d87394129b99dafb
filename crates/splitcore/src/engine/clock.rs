use crate::time::TimeSpan;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// Monotonic time source for the engine.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimeSpan;
}

/// Wall-clock time since construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> TimeSpan {
        let elapsed = self.origin.elapsed();
        TimeSpan::from_nanos(i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX))
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicI64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: TimeSpan) {
        self.nanos.fetch_add(by.total_nanos(), Ordering::SeqCst);
    }

    pub fn set(&self, to: TimeSpan) {
        self.nanos.store(to.total_nanos(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeSpan {
        TimeSpan::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}
