//! Warden Clock Infrastructure
//!
//! Time sources for the admission core:
//!
//! - [`SystemClock`]: wall-clock time for production
//! - [`ManualClock`]: frozen time, moved explicitly, for tests and replays
//!
//! ## Usage
//!
//! ```ignore
//! use warden_clock::{ManualClock, Clock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(None);
//! let before = clock.now();
//! clock.advance(Duration::hours(4));   // jump past a breaker cooldown
//! assert_eq!(clock.now() - before, Duration::hours(4));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use warden_ports::Clock;
