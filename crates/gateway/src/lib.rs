//! Warden Gateway
//!
//! Adapters behind the `warden-ports` traits. The admission core only ever
//! sees `dyn ExchangeGateway` / `dyn DecisionSource`.
//!
//! ## Architecture
//!
//! ```text
//!  Admission Controller      Capital Rebalancer
//!          │                        │
//!          │ fetch_balance          │ fetch_balance / transfer
//!          └──────────┬─────────────┘
//!                ┌────▼────┐
//!                │ Gateway │  (ExchangeGateway port)
//!                └────┬────┘
//!                     │
//!        Paper venues │ or a live exchange adapter
//!          spot / margin / futures
//! ```

pub mod adapters;

// Re-export commonly used types
pub use adapters::paper::{GatewayCallCounts, PaperDecisionSource, PaperGateway, TransferRequest};
