//! Warden Risk Circuit Breaker
//!
//! Stateful, loss-limiting gate consulted before every trade. Unlike the
//! admission checkpoints (which look at one proposal), the breaker tracks the
//! account's realised results across trades:
//!
//! - **Daily loss**: losses measured against the day's starting balance
//! - **Losing streak**: consecutive losing trades
//! - **Single trade loss**: a loss measured against that trade's own value
//! - **Sizing**: position-to-balance ratio and minimum account balance
//!
//! ## States
//!
//! ```text
//!             trip (loss limit)              emergency_stop()
//!   ENABLED ───────────────────► DISABLED ───────────────────► EMERGENCY
//!      ▲                            │                              │
//!      └──── cooldown elapsed ──────┘                              │
//!      └─────────────────────── manual_reset() ────────────────────┘
//! ```
//!
//! State and limits live in `risk_state.json` and `risk_config.json` and are
//! rewritten atomically after every change.

pub mod breaker;
pub mod config;
pub mod error;
pub mod state;

pub use breaker::{CONFIG_FILE, CircuitBreaker, STATE_FILE};
pub use config::{RiskConfig, RiskConfigUpdate};
pub use error::{BreakerError, BreakerResult};
pub use state::{BreakerState, RiskState, RiskStatus, TradeContext};
