use std::sync::Mutex;
use std::time::Duration;

use time::Date;

use crate::UtcDateTime;

/// Source of "now" for staleness and same-day decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> UtcDateTime;

    /// Current UTC calendar date.
    fn today(&self) -> Date {
        self.now().date()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UtcDateTime {
        UtcDateTime::now()
    }
}

/// Manually driven clock for deterministic tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<UtcDateTime>,
}

impl FixedClock {
    pub fn new(now: UtcDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: UtcDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            let advanced = time::Duration::try_from(by)
                .ok()
                .and_then(|delta| guard.into_inner().checked_add(delta))
                .and_then(|value| UtcDateTime::from_offset_datetime(value).ok());
            if let Some(value) = advanced {
                *guard = value;
            }
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> UtcDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
