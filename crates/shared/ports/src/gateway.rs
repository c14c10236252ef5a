use async_trait::async_trait;
use rust_decimal::Decimal;
use warden_core::{Balances, Ticker, TransferReceipt, Venue};

use crate::error::GatewayResult;

/// Port for the exchange gateway
///
/// Implementations talk to a real exchange or simulate one. The core
/// bounds every call with its own timeout, so implementations do not need to.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Balances of one venue, keyed by asset
    async fn fetch_balance(&self, venue: Venue) -> GatewayResult<Balances>;

    /// Ticker for a symbol
    async fn fetch_ticker(&self, symbol: &str) -> GatewayResult<Ticker>;

    /// Move `amount` of the quote asset between venues
    async fn transfer(
        &self,
        amount: Decimal,
        from: Venue,
        to: Venue,
    ) -> GatewayResult<TransferReceipt>;

    /// Gateway name for logging
    fn name(&self) -> &str {
        "ExchangeGateway"
    }
}

/// Port for the decision source (AI or strategy engine producing proposals).
///
/// The core never requests proposals itself; it only checks that the source
/// is reachable before admitting a trade built from its output.
#[async_trait]
pub trait DecisionSource: Send + Sync {
    fn name(&self) -> &str;

    /// Succeeds when the source is reachable and serving
    async fn health_check(&self) -> GatewayResult<()>;
}
