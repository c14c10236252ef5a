//! Risk Configuration
//!
//! The limits the circuit breaker enforces. Persisted as a flat,
//! human-editable JSON document; defaults are written on first run.

use log::warn;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BreakerError, BreakerResult};

/// Limits enforced by the circuit breaker
///
/// Percentages are expressed in percent (4.5 means 4.5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Master switch; an inactive breaker approves everything
    pub enabled: bool,
    /// Daily loss, as % of the day's starting balance, that trips the breaker
    #[serde(with = "rust_decimal::serde::float")]
    pub max_daily_loss_pct: Decimal,
    /// Loss of a single trade, as % of that trade's value, that trips the breaker
    #[serde(with = "rust_decimal::serde::float")]
    pub max_trade_loss_pct: Decimal,
    /// Losing streak length that trips the breaker
    pub max_consecutive_losses: u32,
    /// How long a trip keeps trading disabled
    #[serde(with = "rust_decimal::serde::float")]
    pub cooldown_hours: Decimal,
    /// Account balance below which no trade is approved
    #[serde(with = "rust_decimal::serde::float")]
    pub min_account_balance: Decimal,
    /// Largest position value allowed, as % of the account balance
    #[serde(with = "rust_decimal::serde::float")]
    pub max_position_ratio_pct: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_daily_loss_pct: dec!(5),
            max_trade_loss_pct: dec!(10),
            max_consecutive_losses: 5,
            cooldown_hours: dec!(4),
            min_account_balance: dec!(10),
            max_position_ratio_pct: dec!(25),
        }
    }
}

impl RiskConfig {
    /// Keys accepted in the config document
    pub const FIELDS: [&'static str; 7] = [
        "enabled",
        "max_daily_loss_pct",
        "max_trade_loss_pct",
        "max_consecutive_losses",
        "cooldown_hours",
        "min_account_balance",
        "max_position_ratio_pct",
    ];

    /// Parse a config document.
    ///
    /// Missing keys take their defaults. Unknown keys are logged and ignored,
    /// and returned so callers can surface them.
    pub fn from_json_map(map: Map<String, Value>) -> BreakerResult<(Self, Vec<String>)> {
        let unknown: Vec<String> = map
            .keys()
            .filter(|k| !Self::FIELDS.contains(&k.as_str()))
            .cloned()
            .collect();
        for key in &unknown {
            warn!("[RISK] Ignoring unknown risk config key: {}", key);
        }

        let config: RiskConfig = serde_json::from_value(Value::Object(map))
            .map_err(|e| BreakerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok((config, unknown))
    }

    /// Check that every limit is usable
    pub fn validate(&self) -> BreakerResult<()> {
        let pct_fields = [
            ("max_daily_loss_pct", self.max_daily_loss_pct),
            ("max_trade_loss_pct", self.max_trade_loss_pct),
            ("max_position_ratio_pct", self.max_position_ratio_pct),
        ];
        for (name, value) in pct_fields {
            if value <= Decimal::ZERO || value > Decimal::ONE_HUNDRED {
                return Err(BreakerError::InvalidConfig(format!(
                    "{name} must be in (0, 100], got {value}"
                )));
            }
        }
        if self.max_consecutive_losses == 0 {
            return Err(BreakerError::InvalidConfig(
                "max_consecutive_losses must be at least 1".to_string(),
            ));
        }
        if self.cooldown_hours <= Decimal::ZERO {
            return Err(BreakerError::InvalidConfig(format!(
                "cooldown_hours must be positive, got {}",
                self.cooldown_hours
            )));
        }
        if self.min_account_balance < Decimal::ZERO {
            return Err(BreakerError::InvalidConfig(format!(
                "min_account_balance must not be negative, got {}",
                self.min_account_balance
            )));
        }
        Ok(())
    }

    /// Cooldown as a duration, rounded to the second
    pub fn cooldown(&self) -> chrono::Duration {
        let seconds = (self.cooldown_hours * dec!(3600)).round();
        chrono::Duration::seconds(seconds.to_i64().unwrap_or(i64::MAX / 1000))
    }
}

/// Partial runtime update of [`RiskConfig`]; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfigUpdate {
    pub enabled: Option<bool>,
    pub max_daily_loss_pct: Option<Decimal>,
    pub max_trade_loss_pct: Option<Decimal>,
    pub max_consecutive_losses: Option<u32>,
    pub cooldown_hours: Option<Decimal>,
    pub min_account_balance: Option<Decimal>,
    pub max_position_ratio_pct: Option<Decimal>,
}

impl RiskConfigUpdate {
    /// New config with this update applied on top of `base`
    pub fn apply(&self, base: &RiskConfig) -> RiskConfig {
        RiskConfig {
            enabled: self.enabled.unwrap_or(base.enabled),
            max_daily_loss_pct: self.max_daily_loss_pct.unwrap_or(base.max_daily_loss_pct),
            max_trade_loss_pct: self.max_trade_loss_pct.unwrap_or(base.max_trade_loss_pct),
            max_consecutive_losses: self
                .max_consecutive_losses
                .unwrap_or(base.max_consecutive_losses),
            cooldown_hours: self.cooldown_hours.unwrap_or(base.cooldown_hours),
            min_account_balance: self.min_account_balance.unwrap_or(base.min_account_balance),
            max_position_ratio_pct: self
                .max_position_ratio_pct
                .unwrap_or(base.max_position_ratio_pct),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
