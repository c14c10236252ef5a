//! Rebalancer errors
//!
//! `ensure_balance` turns every one of these into `false`; the detailed
//! variants are for logs and for callers of the `try_` methods.

use thiserror::Error;
use warden_core::{Amount, Venue};
use warden_ports::GatewayError;
use warden_store::StoreError;

#[derive(Error, Debug)]
pub enum RebalanceError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Failed to persist transfer history: {0}")]
    Store(#[from] StoreError),

    #[error("Spot reserve would be breached: {available} available, {required} needed")]
    ReserveViolation { available: Amount, required: Amount },

    #[error("Transfer to {venue} on cooldown for another {remaining_secs}s")]
    Cooldown { venue: Venue, remaining_secs: i64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{0} is the funding source and cannot be topped up")]
    Unfundable(Venue),

    #[error("Transfer rejected by the exchange")]
    Rejected,

    #[error("Invalid rebalancer config: {0}")]
    InvalidConfig(String),
}

pub type RebalanceResult<T> = std::result::Result<T, RebalanceError>;
