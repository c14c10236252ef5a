//! Risk Circuit Breaker
//!
//! Stateful loss-limiting gate:
//! - Trips to DISABLED on daily loss, losing streak or single-trade loss limits
//! - Re-enables itself lazily once the cooldown has elapsed
//! - EMERGENCY stop that only a manual reset clears
//! - Persists its state after every change so a restart never forgets a trip

use chrono::NaiveDate;
use log::{error, info, warn};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use warden_core::{Amount, Timestamp, TradeResult, ValidationOutcome};
use warden_ports::Clock;
use warden_store::JsonDocument;

use crate::config::{RiskConfig, RiskConfigUpdate};
use crate::error::{BreakerError, BreakerResult};
use crate::state::{BreakerState, RiskState, RiskStatus, TradeContext};

/// File holding the human-editable limits
pub const CONFIG_FILE: &str = "risk_config.json";
/// File holding the breaker state snapshot
pub const STATE_FILE: &str = "risk_state.json";

/// Trade results kept in memory for inspection
const HISTORY_CAPACITY: usize = 1000;

struct Persistence {
    config: JsonDocument<RiskConfig>,
    state: JsonDocument<RiskState>,
}

struct Inner {
    config: RiskConfig,
    state: RiskState,
    history: VecDeque<TradeResult>,
}

/// Loss-limiting circuit breaker
///
/// All checks and updates serialize on a single lock, so two concurrent
/// approvals never both pass against a stale loss figure.
pub struct CircuitBreaker {
    clock: Arc<dyn Clock>,
    persistence: Option<Persistence>,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Breaker that keeps its state in memory only
    pub fn in_memory(config: RiskConfig, clock: Arc<dyn Clock>) -> BreakerResult<Self> {
        config.validate()?;
        let today = clock.now().date_naive();
        Ok(Self {
            clock,
            persistence: None,
            inner: Mutex::new(Inner {
                config,
                state: RiskState::fresh(today),
                history: VecDeque::new(),
            }),
        })
    }

    /// Open the breaker backed by `risk_config.json` and `risk_state.json` in `state_dir`.
    ///
    /// A missing config is created with defaults. An unreadable or invalid
    /// document is logged and replaced by defaults; only a failure to write
    /// the initial documents is an error.
    pub fn open(state_dir: impl AsRef<Path>, clock: Arc<dyn Clock>) -> BreakerResult<Self> {
        let dir = state_dir.as_ref();
        let config_path = dir.join(CONFIG_FILE);
        let persistence = Persistence {
            config: JsonDocument::new(&config_path),
            state: JsonDocument::new(dir.join(STATE_FILE)),
        };

        let config = load_config(&config_path);
        if !persistence.config.exists() {
            info!("[RISK] Writing default risk config to {}", config_path.display());
            persistence.config.save(&config)?;
        }

        let now = clock.now();
        let mut state = persistence
            .state
            .load_or_else(|| RiskState::fresh(now.date_naive()));
        if stamp_missing_disable_time(&mut state, now) || !persistence.state.exists() {
            persistence.state.save(&state)?;
        }

        info!(
            "[RISK] Circuit breaker loaded: state={} daily_pnl={} losses={} (limits: daily {}%, trade {}%, streak {})",
            state.breaker_state(),
            state.daily_pnl,
            state.consecutive_losses,
            config.max_daily_loss_pct,
            config.max_trade_loss_pct,
            config.max_consecutive_losses
        );

        Ok(Self {
            clock,
            persistence: Some(persistence),
            inner: Mutex::new(Inner {
                config,
                state,
                history: VecDeque::new(),
            }),
        })
    }

    /// Decide whether a trade may proceed.
    ///
    /// Never fails: persistence problems while recording a transition are
    /// logged and the decision still stands.
    pub fn check_approval(&self, context: &TradeContext) -> ValidationOutcome {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if !inner.config.enabled {
            return ValidationOutcome::approved("Circuit breaker inactive");
        }

        let mut changed = roll_over(&mut inner.state, now.date_naive());

        let outcome = match inner.state.breaker_state() {
            BreakerState::Emergency => {
                let reason = inner
                    .state
                    .emergency_reason
                    .clone()
                    .unwrap_or_else(|| "no reason given".to_string());
                Some(ValidationOutcome::denied(format!(
                    "Emergency stop active ({reason}); manual reset required"
                )))
            }
            BreakerState::Disabled => {
                let cooldown = inner.config.cooldown();
                if stamp_missing_disable_time(&mut inner.state, now) {
                    changed = true;
                }
                match inner.state.disable_timestamp {
                    Some(since) if now - since < cooldown => {
                        let remaining = remaining_minutes(since + cooldown - now);
                        let reason = inner
                            .state
                            .disable_reason
                            .clone()
                            .unwrap_or_else(|| "risk limit reached".to_string());
                        Some(ValidationOutcome::denied(format!(
                            "Trading disabled: {reason}. Cooldown ends in {remaining} minutes"
                        )))
                    }
                    _ => {
                        info!("[RISK] Cooldown elapsed, trading re-enabled");
                        inner.state.trading_disabled = false;
                        inner.state.disable_timestamp = None;
                        inner.state.disable_reason = None;
                        changed = true;
                        None
                    }
                }
            }
            BreakerState::Enabled => None,
        };

        let outcome = outcome.unwrap_or_else(|| {
            let Inner { config, state, .. } = &mut *inner;
            run_limit_checks(config, state, context, now, &mut changed)
        });

        if changed {
            self.persist_logged(&inner.state);
        }
        if outcome.is_denied() {
            warn!("[RISK] Trade denied: {}", outcome.reason);
        }
        outcome
    }

    /// Feed back a realised trade result
    pub fn record_trade_result(&self, result: &TradeResult) -> BreakerResult<()> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        roll_over(&mut inner.state, now.date_naive());

        if inner.history.len() >= HISTORY_CAPACITY {
            inner.history.pop_front();
        }
        inner.history.push_back(result.clone());

        let Inner { config, state, .. } = &mut *inner;
        state.daily_pnl = state.daily_pnl.saturating_add(result.pnl);
        if result.is_loss() {
            state.consecutive_losses += 1;
        } else if result.is_win() {
            state.consecutive_losses = 0;
        }

        info!(
            "[RISK] Trade recorded: pnl={} ({}%), daily_pnl={}, losses in a row={}",
            result.pnl, result.pnl_pct, state.daily_pnl, state.consecutive_losses
        );

        if config.enabled && state.breaker_state() == BreakerState::Enabled {
            let trade_loss_pct = result.loss_pct_of_trade();
            let daily_loss_pct = state.daily_loss_pct();
            let reason = if trade_loss_pct >= config.max_trade_loss_pct {
                Some(format!(
                    "Single trade loss {:.2}% reached limit {}%",
                    trade_loss_pct, config.max_trade_loss_pct
                ))
            } else if daily_loss_pct >= config.max_daily_loss_pct {
                Some(daily_loss_reason(daily_loss_pct, config))
            } else if state.consecutive_losses >= config.max_consecutive_losses {
                Some(streak_reason(state.consecutive_losses, config))
            } else {
                None
            };
            if let Some(reason) = reason {
                trip(state, reason, now);
            }
        }

        self.persist(&inner.state)
    }

    /// Stop all trading until a manual reset
    pub fn emergency_stop(&self, reason: impl Into<String>) -> BreakerResult<()> {
        let reason = reason.into();
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        error!("[RISK] EMERGENCY STOP: {}", reason);
        let state = &mut inner.state;
        state.emergency_mode = true;
        state.emergency_reason = Some(reason.clone());
        state.trading_disabled = true;
        state.disable_timestamp = Some(now);
        state.disable_reason = Some(format!("Emergency stop: {reason}"));

        self.persist(&inner.state)
    }

    /// Return to a clean ENABLED state. Calling it twice leaves the same state.
    ///
    /// The day's starting balance is kept; everything else is zeroed.
    pub fn manual_reset(&self) -> BreakerResult<()> {
        let today = self.clock.now().date_naive();
        let mut inner = self.inner.lock();

        let previous = inner.state.breaker_state();
        inner.state = RiskState {
            daily_start_balance: inner.state.daily_start_balance,
            ..RiskState::fresh(today)
        };
        info!("[RISK] Manual reset (was {}), trading enabled", previous);

        self.persist(&inner.state)
    }

    /// Set the balance daily losses are measured against
    pub fn set_daily_start_balance(&self, balance: Amount) -> BreakerResult<()> {
        let today = self.clock.now().date_naive();
        let mut inner = self.inner.lock();

        roll_over(&mut inner.state, today);
        inner.state.daily_start_balance = balance;
        info!("[RISK] Daily start balance set to {}", balance);

        self.persist(&inner.state)
    }

    /// Apply and persist a runtime config change
    pub fn update_config(&self, update: &RiskConfigUpdate) -> BreakerResult<RiskConfig> {
        let mut inner = self.inner.lock();

        let config = update.apply(&inner.config);
        config.validate()?;
        if let Some(persistence) = &self.persistence {
            persistence.config.save(&config)?;
        }
        info!("[RISK] Risk config updated: {:?}", config);
        inner.config = config.clone();
        Ok(config)
    }

    pub fn config(&self) -> RiskConfig {
        self.inner.lock().config.clone()
    }

    /// Copy of the current state
    pub fn state(&self) -> RiskState {
        self.inner.lock().state.clone()
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.inner.lock().state.breaker_state()
    }

    /// Recorded trade results, oldest first
    pub fn trade_history(&self) -> Vec<TradeResult> {
        self.inner.lock().history.iter().cloned().collect()
    }

    /// Full status report; does not trigger any transition
    pub fn risk_status(&self) -> RiskStatus {
        let now = self.clock.now();
        let inner = self.inner.lock();
        let state = &inner.state;

        let cooldown_remaining_minutes = match (state.breaker_state(), state.disable_timestamp) {
            (BreakerState::Disabled, Some(since)) => {
                let remaining = since + inner.config.cooldown() - now;
                Some(remaining_minutes(remaining).max(0))
            }
            _ => None,
        };

        RiskStatus {
            state: state.breaker_state(),
            active: inner.config.enabled,
            daily_pnl: state.daily_pnl,
            daily_start_balance: state.daily_start_balance,
            daily_loss_pct: state.daily_loss_pct(),
            consecutive_losses: state.consecutive_losses,
            disable_timestamp: state.disable_timestamp,
            disable_reason: state.disable_reason.clone(),
            emergency_reason: state.emergency_reason.clone(),
            cooldown_remaining_minutes,
            last_reset_date: state.last_reset_date,
            trades_recorded: inner.history.len(),
            config: inner.config.clone(),
        }
    }

    fn persist(&self, state: &RiskState) -> BreakerResult<()> {
        match &self.persistence {
            Some(persistence) => persistence.state.save(state).map_err(BreakerError::from),
            None => Ok(()),
        }
    }

    fn persist_logged(&self, state: &RiskState) {
        if let Err(e) = self.persist(state) {
            error!("[RISK] Failed to persist risk state: {}", e);
        }
    }
}

fn load_config(path: &Path) -> RiskConfig {
    let raw: JsonDocument<Map<String, Value>> = JsonDocument::new(path);
    match raw.load() {
        Ok(Some(map)) => match RiskConfig::from_json_map(map) {
            Ok((config, _unknown)) => config,
            Err(e) => {
                error!("[RISK] {} rejected, using defaults: {}", path.display(), e);
                RiskConfig::default()
            }
        },
        Ok(None) => RiskConfig::default(),
        Err(e) => {
            error!("[RISK] {} unreadable, using defaults: {}", path.display(), e);
            RiskConfig::default()
        }
    }
}

/// Zero the daily figures on the first call of a new date.
///
/// A running cooldown and an emergency stop are left untouched.
fn roll_over(state: &mut RiskState, today: NaiveDate) -> bool {
    if today <= state.last_reset_date {
        return false;
    }
    info!(
        "[RISK] New trading day {}: daily_pnl was {}, losses in a row {}",
        today, state.daily_pnl, state.consecutive_losses
    );
    state.daily_pnl = Decimal::ZERO;
    state.consecutive_losses = 0;
    state.last_reset_date = today;
    true
}

fn trip(state: &mut RiskState, reason: String, now: Timestamp) {
    error!("[RISK] Circuit breaker tripped: {}", reason);
    state.trading_disabled = true;
    state.disable_timestamp = Some(now);
    state.disable_reason = Some(reason);
}

/// Daily loss, losing streak, position ratio, minimum balance; first failure wins
fn run_limit_checks(
    config: &RiskConfig,
    state: &mut RiskState,
    context: &TradeContext,
    now: Timestamp,
    changed: &mut bool,
) -> ValidationOutcome {
    let daily_loss_pct = state.daily_loss_pct();
    if daily_loss_pct >= config.max_daily_loss_pct {
        let reason = daily_loss_reason(daily_loss_pct, config);
        trip(state, reason.clone(), now);
        *changed = true;
        return ValidationOutcome::denied(reason);
    }

    if state.consecutive_losses >= config.max_consecutive_losses {
        let reason = streak_reason(state.consecutive_losses, config);
        trip(state, reason.clone(), now);
        *changed = true;
        return ValidationOutcome::denied(reason);
    }

    if context.position_value > Decimal::ZERO {
        if context.account_balance <= Decimal::ZERO {
            return ValidationOutcome::denied(format!(
                "Position of {} requested with no account balance",
                context.position_value
            ));
        }
        let Some(ratio_pct) = context
            .position_value
            .checked_div(context.account_balance)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        else {
            return ValidationOutcome::denied(format!(
                "Position of {} is out of proportion to balance {}",
                context.position_value, context.account_balance
            ));
        };
        if ratio_pct > config.max_position_ratio_pct {
            return ValidationOutcome::denied(format!(
                "Position size {:.2}% of balance exceeds {}%",
                ratio_pct, config.max_position_ratio_pct
            ));
        }
    }

    if context.account_balance < config.min_account_balance {
        return ValidationOutcome::denied(format!(
            "Account balance {} below minimum {}",
            context.account_balance, config.min_account_balance
        ));
    }

    ValidationOutcome::approved("All risk checks passed")
}

fn daily_loss_reason(daily_loss_pct: Decimal, config: &RiskConfig) -> String {
    format!(
        "Daily loss limit reached: {:.2}% >= {}%",
        daily_loss_pct, config.max_daily_loss_pct
    )
}

fn streak_reason(losses: u32, config: &RiskConfig) -> String {
    format!(
        "Consecutive loss limit reached: {} >= {}",
        losses, config.max_consecutive_losses
    )
}

/// A disabled state without a disable time restarts its cooldown from `now`
fn stamp_missing_disable_time(state: &mut RiskState, now: Timestamp) -> bool {
    if state.trading_disabled && state.disable_timestamp.is_none() {
        error!("[RISK] Trading disabled with no disable time, cooldown restarts now");
        state.disable_timestamp = Some(now);
        return true;
    }
    false
}

/// Whole minutes, rounded up
fn remaining_minutes(remaining: chrono::Duration) -> i64 {
    (remaining.num_seconds() + 59).div_euclid(60)
}
