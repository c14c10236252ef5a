//! Circuit breaker errors
//!
//! Business denials are never errors; these cover configuration problems and
//! failures to persist state.

use thiserror::Error;
use warden_store::StoreError;

#[derive(Error, Debug)]
pub enum BreakerError {
    #[error("Invalid risk config: {0}")]
    InvalidConfig(String),

    #[error("Failed to persist risk state: {0}")]
    Store(#[from] StoreError),
}

pub type BreakerResult<T> = std::result::Result<T, BreakerError>;
