//! Paper exchange - simulated spot/margin/futures wallets
//!
//! Holds one quote-asset balance per venue and a ticker table. Faults can be
//! injected per venue (unavailable, slow) and per operation (transfer
//! failures) to exercise the core's fail-closed paths.

use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;
use warden_core::{AssetBalance, Balances, Ticker, TransferReceipt, Venue};
use warden_ports::{ExchangeGateway, GatewayError, GatewayResult};

/// A transfer the paper exchange accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub amount: Decimal,
    pub from: Venue,
    pub to: Venue,
    pub transaction_id: String,
}

/// Number of calls per gateway operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayCallCounts {
    pub fetch_balance: u64,
    pub fetch_ticker: u64,
    pub transfer: u64,
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: HashSet<Venue>,
    latency: HashMap<Venue, Duration>,
    transfer_error: Option<GatewayError>,
    transfer_stalled: bool,
    ticker_error: Option<GatewayError>,
}

#[derive(Debug, Default)]
struct CallCounters {
    fetch_balance: AtomicU64,
    fetch_ticker: AtomicU64,
    transfer: AtomicU64,
    balance_by_venue: Mutex<HashMap<Venue, u64>>,
}

/// In-memory exchange implementing [`ExchangeGateway`]
pub struct PaperGateway {
    quote_asset: String,
    balances: RwLock<HashMap<Venue, Decimal>>,
    tickers: RwLock<HashMap<String, Ticker>>,
    faults: RwLock<Faults>,
    transfers: Mutex<Vec<TransferRequest>>,
    calls: CallCounters,
}

impl PaperGateway {
    /// Create a paper exchange with empty wallets
    pub fn new(quote_asset: impl Into<String>) -> Self {
        Self {
            quote_asset: quote_asset.into(),
            balances: RwLock::new(HashMap::new()),
            tickers: RwLock::new(HashMap::new()),
            faults: RwLock::new(Faults::default()),
            transfers: Mutex::new(Vec::new()),
            calls: CallCounters::default(),
        }
    }

    /// Builder-style initial balance
    pub fn with_balance(self, venue: Venue, amount: Decimal) -> Self {
        self.set_balance(venue, amount);
        self
    }

    /// Builder-style ticker
    pub fn with_ticker(self, ticker: Ticker) -> Self {
        self.set_ticker(ticker);
        self
    }

    pub fn quote_asset(&self) -> &str {
        &self.quote_asset
    }

    pub fn set_balance(&self, venue: Venue, amount: Decimal) {
        self.balances.write().insert(venue, amount);
    }

    /// Current quote-asset balance of a venue
    pub fn balance(&self, venue: Venue) -> Decimal {
        self.balances
            .read()
            .get(&venue)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn set_ticker(&self, ticker: Ticker) {
        self.tickers.write().insert(ticker.symbol.clone(), ticker);
    }

    /// Make every call touching `venue` fail with `Unavailable`
    pub fn set_venue_unavailable(&self, venue: Venue, unavailable: bool) {
        let mut faults = self.faults.write();
        if unavailable {
            faults.unavailable.insert(venue);
        } else {
            faults.unavailable.remove(&venue);
        }
    }

    /// Delay balance queries for `venue` (used to trip caller timeouts)
    pub fn set_latency(&self, venue: Venue, latency: Duration) {
        self.faults.write().latency.insert(venue, latency);
    }

    /// Fail every transfer with `error` until cleared with `None`
    pub fn set_transfer_error(&self, error: Option<GatewayError>) {
        self.faults.write().transfer_error = error;
    }

    /// Make transfers hang until the caller gives up
    pub fn set_transfer_stalled(&self, stalled: bool) {
        self.faults.write().transfer_stalled = stalled;
    }

    pub fn set_ticker_error(&self, error: Option<GatewayError>) {
        self.faults.write().ticker_error = error;
    }

    /// Transfers accepted so far, oldest first
    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.transfers.lock().clone()
    }

    pub fn call_counts(&self) -> GatewayCallCounts {
        GatewayCallCounts {
            fetch_balance: self.calls.fetch_balance.load(Ordering::SeqCst),
            fetch_ticker: self.calls.fetch_ticker.load(Ordering::SeqCst),
            transfer: self.calls.transfer.load(Ordering::SeqCst),
        }
    }

    /// Balance queries issued for one venue
    pub fn balance_calls_for(&self, venue: Venue) -> u64 {
        self.calls
            .balance_by_venue
            .lock()
            .get(&venue)
            .copied()
            .unwrap_or(0)
    }

    fn check_available(&self, venue: Venue) -> GatewayResult<()> {
        if self.faults.read().unavailable.contains(&venue) {
            return Err(GatewayError::Unavailable(format!("{venue} wallet offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeGateway for PaperGateway {
    async fn fetch_balance(&self, venue: Venue) -> GatewayResult<Balances> {
        self.calls.fetch_balance.fetch_add(1, Ordering::SeqCst);
        *self.calls.balance_by_venue.lock().entry(venue).or_insert(0) += 1;

        let latency = self.faults.read().latency.get(&venue).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.check_available(venue)?;

        let amount = self.balance(venue);
        debug!("Paper balance {}: {} {}", venue, amount, self.quote_asset);
        Ok(Balances::new().with_asset(self.quote_asset.clone(), AssetBalance::unlocked(amount)))
    }

    async fn fetch_ticker(&self, symbol: &str) -> GatewayResult<Ticker> {
        self.calls.fetch_ticker.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.faults.read().ticker_error.clone() {
            return Err(error);
        }
        self.tickers
            .read()
            .get(symbol)
            .cloned()
            .ok_or_else(|| GatewayError::Exchange(format!("unknown symbol {symbol}")))
    }

    async fn transfer(
        &self,
        amount: Decimal,
        from: Venue,
        to: Venue,
    ) -> GatewayResult<TransferReceipt> {
        self.calls.transfer.fetch_add(1, Ordering::SeqCst);

        let stalled = self.faults.read().transfer_stalled;
        if stalled {
            std::future::pending::<()>().await;
        }
        if let Some(error) = self.faults.read().transfer_error.clone() {
            warn!("Paper transfer {} {} -> {} failed: {}", amount, from, to, error);
            return Err(error);
        }
        self.check_available(from)?;
        self.check_available(to)?;

        if amount <= Decimal::ZERO {
            return Err(GatewayError::Exchange(format!(
                "transfer amount must be positive, got {amount}"
            )));
        }
        if from == to {
            return Err(GatewayError::Exchange(format!(
                "source and destination are both {from}"
            )));
        }

        {
            let mut balances = self.balances.write();
            let available = balances.get(&from).copied().unwrap_or(Decimal::ZERO);
            if available < amount {
                return Err(GatewayError::InsufficientFunds {
                    venue: from,
                    requested: amount.to_string(),
                    available: available.to_string(),
                });
            }
            *balances.entry(from).or_insert(Decimal::ZERO) -= amount;
            *balances.entry(to).or_insert(Decimal::ZERO) += amount;
        }

        let transaction_id = Uuid::new_v4().to_string();
        info!(
            "Paper transfer {} {} {} -> {} ({})",
            amount, self.quote_asset, from, to, transaction_id
        );
        self.transfers.lock().push(TransferRequest {
            amount,
            from,
            to,
            transaction_id: transaction_id.clone(),
        });

        Ok(TransferReceipt::accepted(transaction_id))
    }

    fn name(&self) -> &str {
        "PaperGateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gateway() -> PaperGateway {
        PaperGateway::new("USDT")
            .with_balance(Venue::Spot, dec!(100))
            .with_balance(Venue::Futures, dec!(5))
    }

    #[tokio::test]
    async fn test_fetch_balance_reports_quote_asset() {
        let gw = gateway();
        let balances = gw.fetch_balance(Venue::Spot).await.unwrap();
        assert_eq!(balances.free("USDT"), dec!(100));

        let margin = gw.fetch_balance(Venue::Margin).await.unwrap();
        assert_eq!(margin.free("USDT"), Decimal::ZERO);

        assert_eq!(gw.call_counts().fetch_balance, 2);
        assert_eq!(gw.balance_calls_for(Venue::Spot), 1);
    }

    #[tokio::test]
    async fn test_transfer_moves_funds() {
        let gw = gateway();
        let receipt = gw.transfer(dec!(50), Venue::Spot, Venue::Futures).await.unwrap();

        assert!(receipt.success);
        assert!(receipt.transaction_id.is_some());
        assert_eq!(gw.balance(Venue::Spot), dec!(50));
        assert_eq!(gw.balance(Venue::Futures), dec!(55));
        assert_eq!(gw.transfers().len(), 1);
    }

    #[tokio::test]
    async fn test_transfer_insufficient_funds() {
        let gw = gateway();
        let err = gw
            .transfer(dec!(500), Venue::Spot, Venue::Margin)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::InsufficientFunds { .. }));
        assert_eq!(gw.balance(Venue::Spot), dec!(100));
        assert!(gw.transfers().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_venue() {
        let gw = gateway();
        gw.set_venue_unavailable(Venue::Margin, true);

        assert!(gw.fetch_balance(Venue::Margin).await.is_err());
        assert!(gw.transfer(dec!(10), Venue::Spot, Venue::Margin).await.is_err());

        gw.set_venue_unavailable(Venue::Margin, false);
        assert!(gw.fetch_balance(Venue::Margin).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_transfer_error() {
        let gw = gateway();
        gw.set_transfer_error(Some(GatewayError::Connection("reset".into())));
        assert!(gw.transfer(dec!(10), Venue::Spot, Venue::Futures).await.is_err());
        assert_eq!(gw.call_counts().transfer, 1);
        assert_eq!(gw.balance(Venue::Spot), dec!(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_delays_balance() {
        let gw = gateway();
        gw.set_latency(Venue::Spot, Duration::from_secs(5));

        let result =
            tokio::time::timeout(Duration::from_secs(2), gw.fetch_balance(Venue::Spot)).await;
        assert!(result.is_err(), "slow venue should exceed the caller's timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_transfer_never_completes() {
        let gw = gateway();
        gw.set_transfer_stalled(true);

        let result = tokio::time::timeout(
            Duration::from_secs(3600),
            gw.transfer(dec!(10), Venue::Spot, Venue::Futures),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(gw.balance(Venue::Spot), dec!(100));
        assert!(gw.transfers().is_empty());
    }

    #[tokio::test]
    async fn test_ticker_lookup() {
        let gw = gateway().with_ticker(Ticker {
            symbol: "BTC/USDT".to_string(),
            last: dec!(60000),
            percentage: Some(dec!(2.5)),
            quote_volume: Some(dec!(1_000_000)),
        });

        assert_eq!(gw.fetch_ticker("BTC/USDT").await.unwrap().last, dec!(60000));
        assert!(gw.fetch_ticker("DOGE/USDT").await.is_err());
    }
}
