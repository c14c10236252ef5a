use thiserror::Error;
use warden_core::Venue;

/// Errors raised by the exchange gateway and the decision source.
///
/// All of these are transient from the core's point of view: a failing
/// dependency fails the current admission and the cycle is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Exchange error: {0}")]
    Exchange(String),

    #[error("Insufficient funds on {venue}: requested {requested}, available {available}")]
    InsufficientFunds {
        venue: Venue,
        requested: String,
        available: String,
    },

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Timeouts and connection problems, as opposed to an explicit refusal
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Timeout(_) | GatewayError::Connection(_) | GatewayError::Unavailable(_)
        )
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
