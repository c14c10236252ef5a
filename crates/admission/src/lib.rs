//! Warden Admission Controller
//!
//! Gates every proposed trade. A proposal is approved only when the circuit
//! breaker allows trading and all five checkpoints pass, in order:
//!
//! | # | Checkpoint | Failure kind |
//! |---|------------|--------------|
//! | - | Risk gate (circuit breaker) | `RiskLimit` |
//! | 1 | Dependency health | `DependencyUnhealthy` |
//! | 2 | Capital sufficiency | `InsufficientCapital` |
//! | 3 | Decision quality | `InvalidProposal`, `LowConfidence` |
//! | 4 | Indicator sanity | `InvalidIndicator` |
//! | 5 | Per-symbol cooldown | `OnCooldown` |
//!
//! The first failure ends the evaluation; later checkpoints never run.

pub mod audit;
pub mod checkpoints;
pub mod config;
pub mod controller;
pub mod error;

pub use audit::{AuditLog, FailureRecord};
pub use checkpoints::{CheckResult, CheckpointValidator, Denial};
pub use config::AdmissionConfig;
pub use controller::{AdmissionController, CapitalCheck};
pub use error::{AdmissionError, Result};
