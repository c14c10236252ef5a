//! Paper exchange adapter
//!
//! In-memory venues with fault injection and call accounting. Used for
//! paper sessions and as the test double for the admission core.

mod decision;
mod exchange;

pub use decision::PaperDecisionSource;
pub use exchange::{GatewayCallCounts, PaperGateway, TransferRequest};
