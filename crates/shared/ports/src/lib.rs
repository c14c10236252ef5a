//! Warden Ports
//!
//! Port definitions (traits) for the Warden trade admission core.
//! These define the boundaries between the admission logic and the
//! exchange, the decision source, and time.

mod clock;
mod error;
mod gateway;

pub use clock::Clock;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{DecisionSource, ExchangeGateway};
