//! Warden Capital Rebalancer
//!
//! Keeps capital where trades need it. Spot is the funding pool; margin and
//! futures are topped up on demand, swept back on request, and periodically
//! steered towards a target allocation.
//!
//! Guarantees:
//! - Never two successful transfers into one venue within the transfer cooldown
//! - Never leaves spot below its reserve
//! - Never stacks transfers: one operation at a time per rebalancer

pub mod config;
pub mod error;
pub mod history;
pub mod rebalancer;

pub use config::{RebalancerConfig, TargetAllocation};
pub use error::{RebalanceError, RebalanceResult};
pub use history::{HISTORY_FILE, TransferHistory};
pub use rebalancer::{CapitalRebalancer, ConsolidationReport};
