//! Admission errors
//!
//! Denials are outcomes, not errors. The only error is a config that cannot
//! be used to build a controller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("Invalid admission config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AdmissionError>;
