use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{Amount, Timestamp};

/// Realised outcome of an executed trade, fed back to the circuit breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    /// Realised profit (positive) or loss (negative) in the quote asset
    pub pnl: Amount,
    /// PnL as a percentage of the trade value, as reported by the executor
    pub pnl_pct: Decimal,
    /// Notional value of the trade
    pub trade_value: Amount,
    pub timestamp: Timestamp,
}

impl TradeResult {
    /// Build a result, deriving `pnl_pct` from the trade value
    pub fn new(pnl: Amount, trade_value: Amount, timestamp: Timestamp) -> Self {
        let pnl_pct = if trade_value > Decimal::ZERO {
            let pct = percent_of(pnl.abs(), trade_value);
            if pnl < Decimal::ZERO { -pct } else { pct }
        } else {
            Decimal::ZERO
        };
        Self {
            pnl,
            pnl_pct,
            trade_value,
            timestamp,
        }
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < Decimal::ZERO
    }

    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    /// Loss as a percentage of this trade's own value (0 for winners)
    pub fn loss_pct_of_trade(&self) -> Decimal {
        if !self.is_loss() || self.trade_value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        percent_of(self.pnl.abs(), self.trade_value)
    }
}

/// `part / whole * 100` for non-negative `part` and positive `whole`,
/// saturating at `Decimal::MAX`
fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX)
}
