//! Rebalancer configuration

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration as StdDuration;
use warden_core::{Amount, Venue};

use crate::error::{RebalanceError, RebalanceResult};

/// Target share of total capital per venue, in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetAllocation {
    pub spot: Decimal,
    pub margin: Decimal,
    pub futures: Decimal,
}

impl Default for TargetAllocation {
    fn default() -> Self {
        Self {
            spot: dec!(60),
            margin: dec!(25),
            futures: dec!(15),
        }
    }
}

impl TargetAllocation {
    pub fn pct(&self, venue: Venue) -> Decimal {
        match venue {
            Venue::Spot => self.spot,
            Venue::Margin => self.margin,
            Venue::Futures => self.futures,
        }
    }

    pub fn total(&self) -> Decimal {
        self.spot + self.margin + self.futures
    }
}

/// Configuration for the Capital Rebalancer
#[derive(Debug, Clone)]
pub struct RebalancerConfig {
    /// Asset moved between venues
    pub quote_asset: String,
    /// Smallest on-demand transfer
    pub default_transfer_amount: Amount,
    /// Added on top of the shortfall
    pub safety_buffer: Amount,
    /// Spot never drops below this after a transfer
    pub min_spot_reserve: Amount,
    /// Minimum gap between two successful transfers to the same venue
    pub transfer_cooldown: Duration,
    /// Left behind on each venue when consolidating
    pub dust_buffer: Amount,
    pub target_allocation: TargetAllocation,
    /// Largest tolerated deviation from target, in percentage points
    pub deviation_threshold_pct: Decimal,
    /// Minimum gap between two periodic rebalances
    pub rebalance_interval: Duration,
    /// Transfer records kept (in memory and on disk)
    pub history_capacity: usize,
    /// Upper bound on every gateway call
    pub call_timeout: StdDuration,
}

impl Default for RebalancerConfig {
    fn default() -> Self {
        Self {
            quote_asset: "USDT".to_string(),
            default_transfer_amount: dec!(50),
            safety_buffer: dec!(5),
            min_spot_reserve: dec!(20),
            transfer_cooldown: Duration::seconds(3600),
            dust_buffer: dec!(1),
            target_allocation: TargetAllocation::default(),
            deviation_threshold_pct: dec!(10),
            rebalance_interval: Duration::hours(4),
            history_capacity: 50,
            call_timeout: StdDuration::from_secs(2),
        }
    }
}

impl RebalancerConfig {
    pub fn validate(&self) -> RebalanceResult<()> {
        if self.quote_asset.trim().is_empty() {
            return Err(RebalanceError::InvalidConfig(
                "quote_asset must not be empty".to_string(),
            ));
        }
        let amounts = [
            ("default_transfer_amount", self.default_transfer_amount),
            ("safety_buffer", self.safety_buffer),
            ("min_spot_reserve", self.min_spot_reserve),
            ("dust_buffer", self.dust_buffer),
        ];
        for (name, value) in amounts {
            if value < Decimal::ZERO {
                return Err(RebalanceError::InvalidConfig(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        if self.target_allocation.total() != Decimal::ONE_HUNDRED {
            return Err(RebalanceError::InvalidConfig(format!(
                "target allocation must sum to 100, got {}",
                self.target_allocation.total()
            )));
        }
        if Venue::ALL
            .iter()
            .any(|v| self.target_allocation.pct(*v) < Decimal::ZERO)
        {
            return Err(RebalanceError::InvalidConfig(
                "target allocation shares must not be negative".to_string(),
            ));
        }
        if self.deviation_threshold_pct <= Decimal::ZERO {
            return Err(RebalanceError::InvalidConfig(
                "deviation_threshold_pct must be positive".to_string(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(RebalanceError::InvalidConfig(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.call_timeout.is_zero() {
            return Err(RebalanceError::InvalidConfig(
                "call_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
