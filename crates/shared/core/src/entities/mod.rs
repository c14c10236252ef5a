mod balance;
mod outcome;
mod proposal;
mod snapshot;
mod trade_result;
mod transfer;
mod venue;

pub use balance::{AccountBalances, AssetBalance, Balances};
pub use outcome::{CheckpointKind, ValidationOutcome};
pub use proposal::{Direction, TradeProposal};
pub use snapshot::{MarketSnapshot, Ticker};
pub use trade_result::TradeResult;
pub use transfer::{TransferKind, TransferReceipt, TransferRecord, TransferStatus};
pub use venue::{TradeType, Venue};
