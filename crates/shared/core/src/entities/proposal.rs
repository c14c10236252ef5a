use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TradeType;
use crate::values::{Amount, Symbol};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Parse a direction as emitted by the decision source.
    ///
    /// Accepts `long`/`short` and the `buy`/`sell` aliases, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Some(Direction::Long),
            "short" | "sell" => Some(Direction::Short),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("LONG"),
            Direction::Short => f.write_str("SHORT"),
        }
    }
}

/// A trade proposal produced by the decision source.
///
/// Fields the decision source fills in are optional so that a structurally
/// incomplete proposal can still be represented and rejected with a reason.
/// `leverage` is a decimal because the source may emit a fractional value,
/// which must be rejected rather than silently truncated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub symbol: Symbol,
    pub trade_type: TradeType,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub leverage: Option<Decimal>,
    /// Confidence in percent (0-100)
    #[serde(default)]
    pub confidence: Option<Decimal>,
    #[serde(default)]
    pub reasoning: Option<String>,
    /// Notional value of the position the trade would open
    #[serde(default)]
    pub position_value: Amount,
    /// Account balance the position is sized against
    #[serde(default)]
    pub account_balance: Amount,
}

impl TradeProposal {
    /// Create an empty proposal for a symbol
    pub fn new(symbol: impl Into<Symbol>, trade_type: TradeType) -> Self {
        Self {
            symbol: symbol.into(),
            trade_type,
            direction: None,
            leverage: None,
            confidence: None,
            reasoning: None,
            position_value: Decimal::ZERO,
            account_balance: Decimal::ZERO,
        }
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    pub fn with_leverage(mut self, leverage: impl Into<Decimal>) -> Self {
        self.leverage = Some(leverage.into());
        self
    }

    pub fn with_confidence(mut self, confidence: impl Into<Decimal>) -> Self {
        self.confidence = Some(confidence.into());
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_sizing(mut self, position_value: Amount, account_balance: Amount) -> Self {
        self.position_value = position_value;
        self.account_balance = account_balance;
        self
    }

    /// Parsed direction, if present and recognised
    pub fn parsed_direction(&self) -> Option<Direction> {
        self.direction.as_deref().and_then(Direction::parse)
    }
}
