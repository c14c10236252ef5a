//! Warden Runner
//!
//! Builds the admission core from a state directory and drives its
//! background work.
//!
//! ```text
//!   state_dir/
//!     risk_config.json ─┐
//!     risk_state.json ──┼──► CircuitBreaker ─┐
//!     transfer_history ─┴──► CapitalRebalancer ─┼──► AdmissionController ◄── control loop
//!                                 ▲               │
//!                                 └── PeriodicRebalance (tokio interval)
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod periodic;
pub mod trading_core;

pub use config::CoreConfig;
pub use error::{Result, RunnerError};
pub use logging::init_logging;
pub use periodic::{PeriodicRebalance, run_once};
pub use trading_core::TradingCore;
