//! Admission configuration

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

use crate::error::{AdmissionError, Result};

/// Configuration for the Admission Controller
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Lowest accepted proposal confidence, in percent
    pub min_confidence: Decimal,
    pub min_leverage: u32,
    pub max_leverage: u32,
    /// Bound on each health probe and balance query
    pub probe_timeout: Duration,
    /// Wait between a capital remediation and the re-check
    pub settle_delay: Duration,
    /// Minimum gap between two admissions of the same symbol
    pub symbol_cooldown: chrono::Duration,
    /// Failure records kept in the audit log
    pub audit_capacity: usize,
    /// Asset whose free balance counts as capital
    pub quote_asset: String,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            min_confidence: dec!(70),
            min_leverage: 1,
            max_leverage: 125,
            probe_timeout: Duration::from_secs(2),
            settle_delay: Duration::from_secs(2),
            symbol_cooldown: chrono::Duration::seconds(300),
            audit_capacity: 500,
            quote_asset: "USDT".to_string(),
        }
    }
}

impl AdmissionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_confidence < Decimal::ZERO || self.min_confidence > Decimal::ONE_HUNDRED {
            return Err(AdmissionError::InvalidConfig(format!(
                "min_confidence must be in [0, 100], got {}",
                self.min_confidence
            )));
        }
        if self.min_leverage == 0 || self.min_leverage > self.max_leverage {
            return Err(AdmissionError::InvalidConfig(format!(
                "leverage range {}..={} is empty or starts at zero",
                self.min_leverage, self.max_leverage
            )));
        }
        if self.probe_timeout.is_zero() {
            return Err(AdmissionError::InvalidConfig(
                "probe_timeout must be positive".to_string(),
            ));
        }
        if self.symbol_cooldown < chrono::Duration::zero() {
            return Err(AdmissionError::InvalidConfig(
                "symbol_cooldown must not be negative".to_string(),
            ));
        }
        if self.audit_capacity == 0 {
            return Err(AdmissionError::InvalidConfig(
                "audit_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AdmissionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_leverage, 125);
        assert_eq!(config.symbol_cooldown.num_seconds(), 300);
    }

    #[test]
    fn test_rejects_empty_leverage_range() {
        let config = AdmissionConfig {
            min_leverage: 10,
            max_leverage: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_confidence_above_100() {
        let config = AdmissionConfig {
            min_confidence: dec!(101),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
