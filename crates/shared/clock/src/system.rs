use chrono::Utc;
use warden_core::Timestamp;
use warden_ports::Clock;

/// Wall-clock time in UTC
///
/// Breaker cooldowns, the daily rollover and transfer cooldowns all read
/// this in production. Rollover uses the UTC calendar date of `now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_tracks_wall_time() {
        let clock = SystemClock::new();
        let drift = clock.now() - Utc::now();
        assert!(drift.abs() < Duration::seconds(1));
    }

    #[test]
    fn test_never_goes_backwards() {
        let clock = SystemClock;
        let earlier = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(clock.now() >= earlier);
    }
}
