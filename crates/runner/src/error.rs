//! Runner errors

use std::path::PathBuf;
use thiserror::Error;
use warden_admission::AdmissionError;
use warden_circuit_breaker::BreakerError;
use warden_rebalancer::RebalanceError;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Cannot create state directory {path}: {source}")]
    StateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Circuit breaker: {0}")]
    Breaker(#[from] BreakerError),

    #[error("Rebalancer: {0}")]
    Rebalancer(#[from] RebalanceError),

    #[error("Admission controller: {0}")]
    Admission(#[from] AdmissionError),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
