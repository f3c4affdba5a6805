use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Source of "now" for the game and the controllers
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> SystemTime;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualClock {
    pub fn at(start: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += delta;
    }

    pub fn set(&self, instant: SystemTime) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::at(UNIX_EPOCH);
        let other = clock.clone();

        clock.advance(Duration::from_secs(3));

        assert_eq!(other.now(), UNIX_EPOCH + Duration::from_secs(3));
    }

    #[test]
    fn manual_clock_set() {
        let clock = ManualClock::at(UNIX_EPOCH);
        let target = UNIX_EPOCH + Duration::from_secs(1_589_710_354);

        clock.set(target);

        assert_eq!(clock.now(), target);
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
