//! Risk State
//!
//! The breaker's mutable state and its persisted snapshot. The same struct is
//! written to `risk_state.json`, so field names are the on-disk format.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::TradeProposal;

use crate::config::RiskConfig;

/// Where the breaker is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BreakerState {
    /// Normal operation
    Enabled,
    /// Tripped; re-enables itself once the cooldown has elapsed
    Disabled,
    /// Stopped by hand; only a manual reset re-enables
    Emergency,
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakerState::Enabled => write!(f, "ENABLED"),
            BreakerState::Disabled => write!(f, "DISABLED"),
            BreakerState::Emergency => write!(f, "EMERGENCY"),
        }
    }
}

/// Persisted risk state
///
/// Invariants:
/// - `trading_disabled` implies `disable_timestamp` is set
/// - `emergency_mode` is only cleared by a manual reset
/// - `daily_pnl` and `consecutive_losses` only reset on date rollover or manual reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    pub trading_disabled: bool,
    pub emergency_mode: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_pnl: Decimal,
    /// Set by the control loop at the start of each day
    #[serde(default, with = "rust_decimal::serde::float")]
    pub daily_start_balance: Decimal,
    pub consecutive_losses: u32,
    pub disable_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub disable_reason: Option<String>,
    #[serde(default)]
    pub emergency_reason: Option<String>,
    pub last_reset_date: NaiveDate,
}

impl RiskState {
    /// Clean state for a given trading day
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            trading_disabled: false,
            emergency_mode: false,
            daily_pnl: Decimal::ZERO,
            daily_start_balance: Decimal::ZERO,
            consecutive_losses: 0,
            disable_timestamp: None,
            disable_reason: None,
            emergency_reason: None,
            last_reset_date: today,
        }
    }

    pub fn breaker_state(&self) -> BreakerState {
        if self.emergency_mode {
            BreakerState::Emergency
        } else if self.trading_disabled {
            BreakerState::Disabled
        } else {
            BreakerState::Enabled
        }
    }

    /// Today's loss as a percentage of the day's starting balance.
    ///
    /// Gains never push the metric below zero. Zero when no start balance is set;
    /// a loss too large to express saturates at `Decimal::MAX`.
    pub fn daily_loss_pct(&self) -> Decimal {
        if self.daily_start_balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let loss = self.daily_pnl.min(Decimal::ZERO).abs();
        loss.checked_div(self.daily_start_balance)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::MAX)
    }
}

/// What the breaker needs to know about a trade it is asked to approve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeContext {
    /// Notional value of the position to open
    pub position_value: Decimal,
    /// Account balance the position is sized against
    pub account_balance: Decimal,
}

impl TradeContext {
    pub fn new(position_value: Decimal, account_balance: Decimal) -> Self {
        Self {
            position_value,
            account_balance,
        }
    }
}

impl From<&TradeProposal> for TradeContext {
    fn from(proposal: &TradeProposal) -> Self {
        Self {
            position_value: proposal.position_value,
            account_balance: proposal.account_balance,
        }
    }
}

/// Full breaker status for observability, independent of any approval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskStatus {
    pub state: BreakerState,
    pub active: bool,
    pub daily_pnl: Decimal,
    pub daily_start_balance: Decimal,
    pub daily_loss_pct: Decimal,
    pub consecutive_losses: u32,
    pub disable_timestamp: Option<DateTime<Utc>>,
    pub disable_reason: Option<String>,
    pub emergency_reason: Option<String>,
    /// Minutes until a timed cooldown ends, when disabled
    pub cooldown_remaining_minutes: Option<i64>,
    pub last_reset_date: NaiveDate,
    pub trades_recorded: usize,
    pub config: RiskConfig,
}
