//! Exchange adapters
//!
//! Adapters implement the `warden-ports` traits against a concrete venue.
//! Only the paper adapter ships here; live exchange adapters plug in behind
//! the same traits.

pub mod paper;

pub use paper::{PaperDecisionSource, PaperGateway};
