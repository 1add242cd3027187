//! Time sources for entry timestamps

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Supplies the time recorded on each entry
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock with whole-second resolution, for tests
#[derive(Debug, Default)]
pub struct FakeClock {
    unix_secs: AtomicI64,
}

impl FakeClock {
    pub fn new(initial_unix_secs: i64) -> Self {
        Self {
            unix_secs: AtomicI64::new(initial_unix_secs),
        }
    }

    pub fn add_secs(&self, delta: i64) {
        self.unix_secs.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.unix_secs.load(Ordering::SeqCst);
        Utc.timestamp_opt(secs, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_clock_advances() {
        let clock = FakeClock::new(0);
        assert_eq!(clock.now().timestamp(), 0);
        clock.add_secs(100);
        clock.add_secs(100);
        assert_eq!(clock.now().timestamp(), 200);
        assert_eq!(clock.now().timestamp_subsec_nanos(), 0);
    }
}
