use warden_core::Timestamp;

/// Port for time abstraction
///
/// Every cooldown in the core (breaker, transfers, symbol admissions) is
/// measured against this clock, so tests can move time explicitly:
/// - Real system time for production
/// - Fixed time, advanced by hand, for deterministic tests
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
