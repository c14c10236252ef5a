//! Capital Rebalancer
//!
//! Moves quote-asset funds between the spot, margin and futures wallets:
//! - On demand, to fund a venue ahead of a trade (`ensure_balance`)
//! - As a manual recovery sweep back to spot (`consolidate_to_spot`)
//! - Periodically, towards a target allocation (`rebalance_allocation`)
//!
//! Spot is the funding source. Every transfer respects the spot reserve and a
//! per-destination cooldown derived from the transfer history. Every gateway
//! call is bounded by `call_timeout`; a transfer that times out is recorded
//! as failed.

use chrono::Duration;
use log::{debug, error, info, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::timeout;
use warden_core::{
    AccountBalances, Amount, Timestamp, TransferKind, TransferRecord, Venue,
};
use warden_ports::{Clock, ExchangeGateway, GatewayError, GatewayResult};

use crate::config::RebalancerConfig;
use crate::error::{RebalanceError, RebalanceResult};
use crate::history::TransferHistory;

/// Result of a consolidation sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsolidationReport {
    /// Every transfer attempted, successful or not
    pub transfers: Vec<TransferRecord>,
    /// Venues left untouched (nothing above dust, or balance unavailable)
    pub skipped: Vec<Venue>,
}

impl ConsolidationReport {
    /// Total amount that reached spot
    pub fn total_moved(&self) -> Amount {
        self.transfers
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.amount)
            .sum()
    }

    pub fn all_succeeded(&self) -> bool {
        self.transfers.iter().all(|r| r.is_success())
    }
}

/// Capital Rebalancer
///
/// The history lock is held across the whole operation, gateway calls
/// included, so two concurrent requests can never stack transfers.
pub struct CapitalRebalancer {
    gateway: Arc<dyn ExchangeGateway>,
    clock: Arc<dyn Clock>,
    config: RebalancerConfig,
    history: Mutex<TransferHistory>,
}

impl CapitalRebalancer {
    /// Rebalancer with an in-memory transfer history
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        clock: Arc<dyn Clock>,
        config: RebalancerConfig,
    ) -> RebalanceResult<Self> {
        config.validate()?;
        let history = TransferHistory::in_memory(config.history_capacity);
        Ok(Self {
            gateway,
            clock,
            config,
            history: Mutex::new(history),
        })
    }

    /// Rebalancer whose history is persisted in `state_dir`
    pub fn open(
        gateway: Arc<dyn ExchangeGateway>,
        clock: Arc<dyn Clock>,
        config: RebalancerConfig,
        state_dir: impl AsRef<Path>,
    ) -> RebalanceResult<Self> {
        config.validate()?;
        let history = TransferHistory::open(state_dir, config.history_capacity);
        info!(
            "[REBALANCE] Loaded {} transfer records via {}",
            history.len(),
            gateway.name()
        );
        Ok(Self {
            gateway,
            clock,
            config,
            history: Mutex::new(history),
        })
    }

    pub fn config(&self) -> &RebalancerConfig {
        &self.config
    }

    /// Make sure `destination` holds at least `required` free funds.
    ///
    /// Returns false when the venue is short and could not be funded; the
    /// reason is logged. Never retries.
    pub async fn ensure_balance(&self, destination: Venue, required: Amount) -> bool {
        match self.try_ensure_balance(destination, required).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    "[REBALANCE] Could not fund {} with {}: {}",
                    destination, required, e
                );
                false
            }
        }
    }

    /// Like [`ensure_balance`](Self::ensure_balance), returning the transfer
    /// made (`None` when the venue was already funded) or why none was possible.
    pub async fn try_ensure_balance(
        &self,
        destination: Venue,
        required: Amount,
    ) -> RebalanceResult<Option<TransferRecord>> {
        if required < Decimal::ZERO {
            return Err(RebalanceError::InvalidAmount(format!(
                "required amount must not be negative, got {required}"
            )));
        }

        let mut history = self.history.lock().await;

        let current = self.free_balance(destination).await?;
        if current >= required {
            debug!(
                "[REBALANCE] {} already holds {} (need {})",
                destination, current, required
            );
            return Ok(None);
        }
        if destination == Venue::Spot {
            return Err(RebalanceError::Unfundable(Venue::Spot));
        }

        let now = self.clock.now();
        self.check_cooldown(&history, destination, now)?;

        let amount = self
            .config
            .default_transfer_amount
            .max(required - current + self.config.safety_buffer);

        let spot = self.free_balance(Venue::Spot).await?;
        let needed = amount + self.config.min_spot_reserve;
        if spot < needed {
            return Err(RebalanceError::ReserveViolation {
                available: spot,
                required: needed,
            });
        }

        info!(
            "[REBALANCE] Funding {}: {} short, transferring {} {} from spot",
            destination,
            required - current,
            amount,
            self.config.quote_asset
        );
        let record = self
            .execute(&mut history, amount, Venue::Spot, destination, TransferKind::OnDemand)
            .await?;
        Ok(Some(record))
    }

    /// Sweep margin and futures back to spot, leaving a dust buffer behind.
    ///
    /// The spot cooldown applies unless `emergency` is set. A failed sweep of
    /// one venue does not stop the other.
    pub async fn consolidate_to_spot(&self, emergency: bool) -> RebalanceResult<ConsolidationReport> {
        let mut history = self.history.lock().await;
        let now = self.clock.now();

        if emergency {
            warn!("[REBALANCE] Emergency consolidation to spot, cooldown bypassed");
        } else {
            self.check_cooldown(&history, Venue::Spot, now)?;
        }

        let mut report = ConsolidationReport::default();
        for venue in [Venue::Margin, Venue::Futures] {
            let free = match self.free_balance(venue).await {
                Ok(free) => free,
                Err(e) => {
                    error!("[REBALANCE] Cannot read {} balance, skipping: {}", venue, e);
                    report.skipped.push(venue);
                    continue;
                }
            };

            let amount = free - self.config.dust_buffer;
            if amount <= Decimal::ZERO {
                debug!("[REBALANCE] {} holds only dust ({})", venue, free);
                report.skipped.push(venue);
                continue;
            }

            match self
                .execute(&mut history, amount, venue, Venue::Spot, TransferKind::Consolidation)
                .await
            {
                Ok(record) => report.transfers.push(record),
                Err(e) => {
                    if let Some(failed) = history.records().pop().filter(|r| !r.is_success()) {
                        report.transfers.push(failed);
                    }
                    error!("[REBALANCE] Consolidation from {} failed: {}", venue, e);
                }
            }
        }

        info!(
            "[REBALANCE] Consolidation moved {} {} to spot",
            report.total_moved(),
            self.config.quote_asset
        );
        Ok(report)
    }

    /// Correct the allocation towards its target with at most one transfer.
    ///
    /// Returns `None` when the allocation is within threshold, the previous
    /// periodic rebalance is too recent, or there is no capital at all.
    pub async fn rebalance_allocation(&self) -> RebalanceResult<Option<TransferRecord>> {
        let mut history = self.history.lock().await;
        let now = self.clock.now();

        if let Some(last) = history.last_success_of(TransferKind::Rebalance)
            && now - last.timestamp < self.config.rebalance_interval
        {
            debug!(
                "[REBALANCE] Periodic rebalance skipped, last one at {}",
                last.timestamp
            );
            return Ok(None);
        }

        let balances = self.fetch_allocation().await?;
        let total = balances.total();
        if total <= Decimal::ZERO {
            return Ok(None);
        }

        let targets = &self.config.target_allocation;
        let deviation = |venue: Venue| balances.share_pct(venue) - targets.pct(venue);

        let max_deviation = Venue::ALL
            .iter()
            .map(|v| deviation(*v).abs())
            .max()
            .unwrap_or(Decimal::ZERO);
        if max_deviation <= self.config.deviation_threshold_pct {
            debug!(
                "[REBALANCE] Allocation within threshold (max deviation {:.2}pp)",
                max_deviation
            );
            return Ok(None);
        }

        let (Some(from), Some(to)) = (
            most_by(|v| deviation(v)),
            most_by(|v| -deviation(v)),
        ) else {
            return Ok(None);
        };

        let excess = deviation(from) / Decimal::ONE_HUNDRED * total;
        let deficit = -deviation(to) / Decimal::ONE_HUNDRED * total;
        let mut amount = excess.min(deficit);
        if from == Venue::Spot {
            amount = amount.min(balances.get(Venue::Spot) - self.config.min_spot_reserve);
        }
        let amount = amount.round_dp_with_strategy(2, RoundingStrategy::ToZero);
        if amount <= Decimal::ZERO {
            return Err(RebalanceError::ReserveViolation {
                available: balances.get(from),
                required: self.config.min_spot_reserve,
            });
        }

        self.check_cooldown(&history, to, now)?;

        info!(
            "[REBALANCE] Allocation off by {:.2}pp, moving {} {} {} -> {}",
            max_deviation, amount, self.config.quote_asset, from, to
        );
        let record = self
            .execute(&mut history, amount, from, to, TransferKind::Rebalance)
            .await?;
        Ok(Some(record))
    }

    /// Free balances of all venues, fetched concurrently
    pub async fn fetch_allocation(&self) -> RebalanceResult<AccountBalances> {
        let (spot, margin, futures) = tokio::join!(
            self.free_balance(Venue::Spot),
            self.free_balance(Venue::Margin),
            self.free_balance(Venue::Futures),
        );
        let mut balances = AccountBalances::new();
        balances.set(Venue::Spot, spot?);
        balances.set(Venue::Margin, margin?);
        balances.set(Venue::Futures, futures?);
        Ok(balances)
    }

    /// Transfer records, oldest first
    pub async fn transfer_history(&self) -> Vec<TransferRecord> {
        self.history.lock().await.records()
    }

    /// Last successful transfer into `venue`
    pub async fn last_transfer_to(&self, venue: Venue) -> Option<TransferRecord> {
        self.history.lock().await.last_success_to(venue).cloned()
    }

    async fn free_balance(&self, venue: Venue) -> RebalanceResult<Amount> {
        let balances = self.bounded(self.gateway.fetch_balance(venue)).await?;
        Ok(balances.free(&self.config.quote_asset))
    }

    async fn bounded<T>(&self, call: impl Future<Output = GatewayResult<T>>) -> GatewayResult<T> {
        let limit = self.config.call_timeout;
        match timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(limit.as_millis() as u64)),
        }
    }

    fn check_cooldown(
        &self,
        history: &TransferHistory,
        venue: Venue,
        now: Timestamp,
    ) -> RebalanceResult<()> {
        if let Some(last) = history.last_success_to(venue) {
            let elapsed = now - last.timestamp;
            if elapsed < self.config.transfer_cooldown {
                let remaining: Duration = self.config.transfer_cooldown - elapsed;
                return Err(RebalanceError::Cooldown {
                    venue,
                    remaining_secs: remaining.num_seconds(),
                });
            }
        }
        Ok(())
    }

    /// Issue one transfer and record the attempt either way
    async fn execute(
        &self,
        history: &mut TransferHistory,
        amount: Amount,
        from: Venue,
        to: Venue,
        kind: TransferKind,
    ) -> RebalanceResult<TransferRecord> {
        let result = self.bounded(self.gateway.transfer(amount, from, to)).await;
        let now = self.clock.now();

        match result {
            Ok(receipt) if receipt.success => {
                let record =
                    TransferRecord::succeeded(now, amount, from, to, kind, receipt.transaction_id);
                info!(
                    "[REBALANCE] Transferred {} {} {} -> {}",
                    amount, self.config.quote_asset, from, to
                );
                history.push_logged(record.clone());
                Ok(record)
            }
            Ok(_) => {
                error!("[REBALANCE] Transfer {} {} -> {} rejected", amount, from, to);
                history.push_logged(TransferRecord::failed(
                    now,
                    amount,
                    from,
                    to,
                    kind,
                    "rejected by exchange",
                ));
                Err(RebalanceError::Rejected)
            }
            Err(e) => {
                error!("[REBALANCE] Transfer {} {} -> {} failed: {}", amount, from, to, e);
                history.push_logged(TransferRecord::failed(now, amount, from, to, kind, e.to_string()));
                Err(RebalanceError::Gateway(e))
            }
        }
    }
}

/// Venue maximising `key`; the earliest venue wins ties
fn most_by(key: impl Fn(Venue) -> Decimal) -> Option<Venue> {
    Venue::ALL
        .iter()
        .copied()
        .fold(None, |best: Option<(Venue, Decimal)>, venue| {
            let value = key(venue);
            match best {
                Some((_, best_value)) if best_value >= value => best,
                _ => Some((venue, value)),
            }
        })
        .map(|(venue, _)| venue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use warden_clock::ManualClock;
    use warden_gateway::PaperGateway;
    use warden_ports::GatewayError;

    fn setup(
        spot: Decimal,
        margin: Decimal,
        futures: Decimal,
    ) -> (CapitalRebalancer, Arc<PaperGateway>, Arc<ManualClock>) {
        let gateway = Arc::new(
            PaperGateway::new("USDT")
                .with_balance(Venue::Spot, spot)
                .with_balance(Venue::Margin, margin)
                .with_balance(Venue::Futures, futures),
        );
        let clock = ManualClock::new(Some(Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap()));
        let rebalancer =
            CapitalRebalancer::new(gateway.clone(), clock.clone(), RebalancerConfig::default())
                .unwrap();
        (rebalancer, gateway, clock)
    }

    #[tokio::test]
    async fn test_funded_venue_needs_no_transfer() {
        let (rebalancer, gateway, _) = setup(dec!(100), dec!(0), dec!(40));

        assert!(rebalancer.ensure_balance(Venue::Futures, dec!(30)).await);
        assert_eq!(gateway.call_counts().transfer, 0);
    }

    #[tokio::test]
    async fn test_transfer_uses_default_amount() {
        let (rebalancer, gateway, _) = setup(dec!(100), dec!(0), dec!(5));

        let record = rebalancer
            .try_ensure_balance(Venue::Futures, dec!(30))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.amount, dec!(50));
        assert_eq!(record.kind, TransferKind::OnDemand);
        assert_eq!(gateway.balance(Venue::Futures), dec!(55));
        assert_eq!(gateway.balance(Venue::Spot), dec!(50));
    }

    #[tokio::test]
    async fn test_large_shortfall_adds_buffer() {
        let (rebalancer, gateway, _) = setup(dec!(500), dec!(10), dec!(0));

        assert!(rebalancer.ensure_balance(Venue::Margin, dec!(200)).await);
        assert_eq!(gateway.transfers()[0].amount, dec!(195));
    }

    #[tokio::test]
    async fn test_reserve_blocks_transfer() {
        let (rebalancer, gateway, _) = setup(dec!(60), dec!(0), dec!(0));

        let err = rebalancer
            .try_ensure_balance(Venue::Futures, dec!(30))
            .await
            .unwrap_err();

        assert!(matches!(err, RebalanceError::ReserveViolation { .. }));
        assert_eq!(gateway.call_counts().transfer, 0);
        assert!(rebalancer.transfer_history().await.is_empty());
    }

    #[tokio::test]
    async fn test_spot_cannot_be_funded() {
        let (rebalancer, _, _) = setup(dec!(10), dec!(500), dec!(0));

        assert!(!rebalancer.ensure_balance(Venue::Spot, dec!(30)).await);
        assert!(rebalancer.ensure_balance(Venue::Spot, dec!(5)).await);
    }

    #[tokio::test]
    async fn test_cooldown_blocks_second_transfer() {
        let (rebalancer, gateway, clock) = setup(dec!(500), dec!(0), dec!(0));

        assert!(rebalancer.ensure_balance(Venue::Futures, dec!(30)).await);
        gateway.set_balance(Venue::Futures, dec!(0));

        clock.advance(Duration::minutes(59));
        let err = rebalancer
            .try_ensure_balance(Venue::Futures, dec!(30))
            .await
            .unwrap_err();
        assert!(matches!(err, RebalanceError::Cooldown { remaining_secs: 60, .. }));

        // other venues have their own cooldown
        assert!(rebalancer.ensure_balance(Venue::Margin, dec!(30)).await);

        clock.advance(Duration::minutes(1));
        assert!(rebalancer.ensure_balance(Venue::Futures, dec!(30)).await);
        assert_eq!(gateway.call_counts().transfer, 3);
    }

    #[tokio::test]
    async fn test_failed_transfer_is_recorded_without_cooldown() {
        let (rebalancer, gateway, _) = setup(dec!(500), dec!(0), dec!(0));
        gateway.set_transfer_error(Some(GatewayError::Connection("reset".into())));

        assert!(!rebalancer.ensure_balance(Venue::Futures, dec!(30)).await);
        let history = rebalancer.transfer_history().await;
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_success());
        assert!(rebalancer.last_transfer_to(Venue::Futures).await.is_none());

        gateway.set_transfer_error(None);
        assert!(rebalancer.ensure_balance(Venue::Futures, dec!(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_transfer_times_out_and_releases_lock() {
        let (rebalancer, gateway, _) = setup(dec!(500), dec!(0), dec!(5));
        gateway.set_transfer_stalled(true);

        let err = rebalancer
            .try_ensure_balance(Venue::Futures, dec!(30))
            .await
            .unwrap_err();
        assert!(matches!(err, RebalanceError::Gateway(GatewayError::Timeout(2000))));

        let history = rebalancer.transfer_history().await;
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_success());

        // the history lock is free again and no cooldown was started
        gateway.set_transfer_stalled(false);
        assert!(rebalancer.ensure_balance(Venue::Futures, dec!(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_balance_read_times_out() {
        let (rebalancer, gateway, _) = setup(dec!(500), dec!(0), dec!(5));
        gateway.set_latency(Venue::Futures, std::time::Duration::from_secs(60));

        let err = rebalancer
            .try_ensure_balance(Venue::Futures, dec!(30))
            .await
            .unwrap_err();
        assert!(matches!(err, RebalanceError::Gateway(GatewayError::Timeout(_))));
        assert_eq!(gateway.call_counts().transfer, 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_transfer_once() {
        let (rebalancer, gateway, _) = setup(dec!(500), dec!(0), dec!(0));
        let rebalancer = Arc::new(rebalancer);

        let a = {
            let r = rebalancer.clone();
            tokio::spawn(async move { r.ensure_balance(Venue::Futures, dec!(30)).await })
        };
        let b = {
            let r = rebalancer.clone();
            tokio::spawn(async move { r.ensure_balance(Venue::Futures, dec!(30)).await })
        };

        assert!(a.await.unwrap());
        assert!(b.await.unwrap());
        assert_eq!(gateway.call_counts().transfer, 1);
    }

    #[tokio::test]
    async fn test_consolidation_leaves_dust() {
        let (rebalancer, gateway, _) = setup(dec!(10), dec!(40), dec!(0.5));

        let report = rebalancer.consolidate_to_spot(false).await.unwrap();

        assert_eq!(report.total_moved(), dec!(39));
        assert_eq!(report.skipped, vec![Venue::Futures]);
        assert_eq!(gateway.balance(Venue::Margin), dec!(1));
        assert_eq!(gateway.balance(Venue::Spot), dec!(49));
    }

    #[tokio::test]
    async fn test_consolidation_cooldown_bypassed_in_emergency() {
        let (rebalancer, gateway, _) = setup(dec!(10), dec!(40), dec!(30));
        rebalancer.consolidate_to_spot(false).await.unwrap();
        gateway.set_balance(Venue::Futures, dec!(20));

        assert!(matches!(
            rebalancer.consolidate_to_spot(false).await,
            Err(RebalanceError::Cooldown { venue: Venue::Spot, .. })
        ));

        let report = rebalancer.consolidate_to_spot(true).await.unwrap();
        assert_eq!(report.total_moved(), dec!(19));
    }

    #[tokio::test]
    async fn test_consolidation_continues_past_offline_venue() {
        let (rebalancer, gateway, _) = setup(dec!(10), dec!(40), dec!(30));
        gateway.set_venue_unavailable(Venue::Margin, true);

        let report = rebalancer.consolidate_to_spot(true).await.unwrap();
        assert_eq!(report.skipped, vec![Venue::Margin]);
        assert_eq!(report.total_moved(), dec!(29));
        assert!(report.all_succeeded());
    }

    #[tokio::test]
    async fn test_rebalance_moves_from_most_over_to_most_under() {
        let (rebalancer, gateway, clock) = setup(dec!(30), dec!(45), dec!(25));

        let record = rebalancer.rebalance_allocation().await.unwrap().unwrap();
        assert_eq!(record.from_venue, Venue::Margin);
        assert_eq!(record.to_venue, Venue::Spot);
        assert_eq!(record.amount, dec!(20));
        assert_eq!(gateway.balance(Venue::Spot), dec!(50));

        clock.advance(Duration::hours(1));
        assert!(rebalancer.rebalance_allocation().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rebalance_within_threshold_is_noop() {
        let (rebalancer, gateway, _) = setup(dec!(55), dec!(30), dec!(15));

        assert!(rebalancer.rebalance_allocation().await.unwrap().is_none());
        assert_eq!(gateway.call_counts().transfer, 0);
    }

    #[tokio::test]
    async fn test_rebalance_from_spot_keeps_reserve() {
        let (rebalancer, gateway, _) = setup(dec!(100), dec!(0), dec!(0));

        let record = rebalancer.rebalance_allocation().await.unwrap().unwrap();
        assert_eq!(record.from_venue, Venue::Spot);
        assert_eq!(record.to_venue, Venue::Margin);
        assert_eq!(record.amount, dec!(25));
        assert!(gateway.balance(Venue::Spot) >= dec!(20));
    }

    #[test]
    fn test_most_by_prefers_first_on_tie() {
        assert_eq!(most_by(|_| Decimal::ONE), Some(Venue::Spot));
        assert_eq!(
            most_by(|v| if v == Venue::Futures { dec!(2) } else { dec!(1) }),
            Some(Venue::Futures)
        );
    }
}
