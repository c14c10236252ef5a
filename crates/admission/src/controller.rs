//! Admission Controller
//!
//! One approve/deny decision per proposed trade. Checkpoints run in a fixed
//! order and the first failure ends the evaluation:
//!
//! 0. Risk gate (circuit breaker, when attached)
//! 1. Dependency health
//! 2. Capital sufficiency (with one remediation attempt)
//! 3. Decision quality
//! 4. Indicator sanity
//! 5. Per-symbol cooldown
//!
//! `validate` never fails and never panics: every path ends in a
//! [`ValidationOutcome`].

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::timeout;
use warden_circuit_breaker::{CircuitBreaker, TradeContext};
use warden_core::{
    Amount, CheckpointKind, MarketSnapshot, Symbol, Timestamp, TradeProposal, TradeType,
    ValidationOutcome, Venue,
};
use warden_ports::{Clock, DecisionSource, ExchangeGateway};
use warden_rebalancer::CapitalRebalancer;

use crate::audit::{AuditLog, FailureRecord};
use crate::checkpoints::{CheckResult, CheckpointValidator, Denial};
use crate::config::AdmissionConfig;
use crate::error::Result;

/// Balance of the venue funding a trade, against what the trade needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapitalCheck {
    pub venue: Venue,
    pub available: Amount,
    pub required: Amount,
}

impl CapitalCheck {
    pub fn is_sufficient(&self) -> bool {
        self.available >= self.required
    }

    pub fn shortfall(&self) -> Amount {
        (self.required - self.available).max(Amount::ZERO)
    }
}

/// Admission Controller
pub struct AdmissionController {
    gateway: Arc<dyn ExchangeGateway>,
    decision_source: Arc<dyn DecisionSource>,
    clock: Arc<dyn Clock>,
    breaker: Option<Arc<CircuitBreaker>>,
    rebalancer: Option<Arc<CapitalRebalancer>>,
    config: AdmissionConfig,
    /// Last admission time per symbol
    admissions: DashMap<Symbol, Timestamp>,
    audit: AuditLog,
}

impl AdmissionController {
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        decision_source: Arc<dyn DecisionSource>,
        clock: Arc<dyn Clock>,
        config: AdmissionConfig,
    ) -> Result<Self> {
        config.validate()?;
        let audit = AuditLog::new(config.audit_capacity);
        Ok(Self {
            gateway,
            decision_source,
            clock,
            breaker: None,
            rebalancer: None,
            config,
            admissions: DashMap::new(),
            audit,
        })
    }

    /// Consult this breaker before the checkpoints
    pub fn with_circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Use this rebalancer to remediate a capital shortfall
    pub fn with_rebalancer(mut self, rebalancer: Arc<CapitalRebalancer>) -> Self {
        self.rebalancer = Some(rebalancer);
        self
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Decide whether a proposed trade may proceed
    pub async fn validate(
        &self,
        symbol: &str,
        trade_type: TradeType,
        proposal: &TradeProposal,
        snapshot: &MarketSnapshot,
        required_capital: Amount,
    ) -> ValidationOutcome {
        match self
            .run_checkpoints(symbol, trade_type, proposal, snapshot, required_capital)
            .await
        {
            Ok(()) => {
                info!(
                    "[ADMISSION] {} {} approved ({} required)",
                    symbol, trade_type, required_capital
                );
                ValidationOutcome::approved(format!("All checkpoints passed for {symbol}"))
            }
            Err(denial) => {
                warn!("[ADMISSION] {} {} denied: {}", symbol, trade_type, denial);
                self.audit.record(FailureRecord {
                    timestamp: self.clock.now(),
                    symbol: symbol.to_string(),
                    kind: denial.kind,
                    message: denial.message.clone(),
                });
                denial.into()
            }
        }
    }

    async fn run_checkpoints(
        &self,
        symbol: &str,
        trade_type: TradeType,
        proposal: &TradeProposal,
        snapshot: &MarketSnapshot,
        required_capital: Amount,
    ) -> CheckResult {
        self.check_risk_gate(proposal)?;
        self.check_dependencies().await?;
        self.check_capital_with_remediation(trade_type.venue(), required_capital)
            .await?;
        CheckpointValidator::check_decision_quality(symbol, trade_type, proposal, &self.config)?;
        CheckpointValidator::check_indicators(snapshot)?;
        self.check_and_stamp_cooldown(symbol)
    }

    /// Local circuit-breaker consultation; no network
    fn check_risk_gate(&self, proposal: &TradeProposal) -> CheckResult {
        let Some(breaker) = &self.breaker else {
            return Ok(());
        };
        let outcome = breaker.check_approval(&TradeContext::from(proposal));
        if outcome.approved {
            Ok(())
        } else {
            Err(Denial::new(CheckpointKind::RiskLimit, outcome.reason))
        }
    }

    /// Checkpoint 1: every venue balance endpoint and the decision source answer in time
    pub async fn check_dependencies(&self) -> CheckResult {
        let (spot, margin, futures, source) = tokio::join!(
            self.probe_venue(Venue::Spot),
            self.probe_venue(Venue::Margin),
            self.probe_venue(Venue::Futures),
            self.probe_decision_source(),
        );

        let failures: Vec<String> = [spot, margin, futures, source]
            .into_iter()
            .filter_map(|r| r.err())
            .collect();
        if failures.is_empty() {
            debug!("[ADMISSION] All dependencies healthy");
            Ok(())
        } else {
            Err(Denial::new(
                CheckpointKind::DependencyUnhealthy,
                failures.join("; "),
            ))
        }
    }

    async fn probe_venue(&self, venue: Venue) -> std::result::Result<(), String> {
        match timeout(self.config.probe_timeout, self.gateway.fetch_balance(venue)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(format!("{venue} balance: {e}")),
            Err(_) => Err(format!(
                "{venue} balance: no answer within {}ms",
                self.config.probe_timeout.as_millis()
            )),
        }
    }

    async fn probe_decision_source(&self) -> std::result::Result<(), String> {
        let name = self.decision_source.name();
        match timeout(self.config.probe_timeout, self.decision_source.health_check()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("{name}: {e}")),
            Err(_) => Err(format!(
                "{name}: no answer within {}ms",
                self.config.probe_timeout.as_millis()
            )),
        }
    }

    /// Checkpoint 2, step one and three: read the venue's free balance
    pub async fn check_capital(
        &self,
        venue: Venue,
        required: Amount,
    ) -> std::result::Result<CapitalCheck, Denial> {
        let balances = timeout(self.config.probe_timeout, self.gateway.fetch_balance(venue))
            .await
            .map_err(|_| {
                Denial::new(
                    CheckpointKind::InsufficientCapital,
                    format!("{venue} balance unavailable: timed out"),
                )
            })?
            .map_err(|e| {
                Denial::new(
                    CheckpointKind::InsufficientCapital,
                    format!("{venue} balance unavailable: {e}"),
                )
            })?;

        Ok(CapitalCheck {
            venue,
            available: balances.free(&self.config.quote_asset),
            required,
        })
    }

    /// Checkpoint 2, step two: ask the rebalancer to fund the venue once
    pub async fn remediate_capital(&self, check: &CapitalCheck) -> bool {
        let Some(rebalancer) = &self.rebalancer else {
            debug!("[ADMISSION] No rebalancer attached, cannot remediate");
            return false;
        };
        info!(
            "[ADMISSION] {} short by {}, requesting transfer",
            check.venue,
            check.shortfall()
        );
        rebalancer.ensure_balance(check.venue, check.required).await
    }

    /// Checkpoint 2: check, remediate once, settle, check again
    async fn check_capital_with_remediation(&self, venue: Venue, required: Amount) -> CheckResult {
        let first = self.check_capital(venue, required).await?;
        if first.is_sufficient() {
            return Ok(());
        }

        if !self.remediate_capital(&first).await {
            return Err(Denial::new(
                CheckpointKind::InsufficientCapital,
                format!(
                    "{venue} has {} of {} required and could not be funded",
                    first.available, required
                ),
            ));
        }

        tokio::time::sleep(self.config.settle_delay).await;

        let second = self.check_capital(venue, required).await?;
        if second.is_sufficient() {
            Ok(())
        } else {
            Err(Denial::new(
                CheckpointKind::InsufficientCapital,
                format!(
                    "{venue} still has {} of {} required after funding",
                    second.available, required
                ),
            ))
        }
    }

    /// Checkpoint 5: deny a repeat inside the window, otherwise stamp now.
    ///
    /// The check and the stamp happen under one map entry lock.
    fn check_and_stamp_cooldown(&self, symbol: &str) -> CheckResult {
        let now = self.clock.now();
        match self.admissions.entry(symbol.to_string()) {
            Entry::Occupied(mut entry) => {
                let elapsed = now - *entry.get();
                if elapsed < self.config.symbol_cooldown {
                    let remaining = self.config.symbol_cooldown - elapsed;
                    return Err(Denial::new(
                        CheckpointKind::OnCooldown,
                        format!(
                            "{symbol} admitted {}s ago; cooldown ends in {}s",
                            elapsed.num_seconds(),
                            remaining.num_seconds()
                        ),
                    ));
                }
                entry.insert(now);
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
            }
        }
        Ok(())
    }

    /// Failures per checkpoint kind since start
    pub fn failure_counts(&self) -> BTreeMap<CheckpointKind, u64> {
        self.audit.counts()
    }

    /// Up to `n` most recent failures, oldest first
    pub fn recent_failures(&self, n: usize) -> Vec<FailureRecord> {
        self.audit.recent(n)
    }

    pub fn last_admission(&self, symbol: &str) -> Option<Timestamp> {
        self.admissions.get(symbol).map(|t| *t)
    }

    /// Operator override: forget a symbol's last admission
    pub fn clear_cooldown(&self, symbol: &str) -> bool {
        let cleared = self.admissions.remove(symbol).is_some();
        if cleared {
            info!("[ADMISSION] Cooldown cleared for {}", symbol);
        }
        cleared
    }
}
