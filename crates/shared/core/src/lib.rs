//! Warden Core Domain
//!
//! Pure domain types for the Warden trade admission core.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Capital
    AccountBalances,
    AssetBalance,
    Balances,
    // Admission
    CheckpointKind,
    Direction,
    MarketSnapshot,
    Ticker,
    TradeProposal,
    TradeResult,
    TradeType,
    // Transfers
    TransferKind,
    TransferReceipt,
    TransferRecord,
    TransferStatus,
    ValidationOutcome,
    Venue,
};
pub use values::{Amount, Symbol, Timestamp};
