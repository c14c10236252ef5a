//! Checkpoint Validation
//!
//! The checkpoints that need no I/O: decision quality and indicator sanity.
//! Stateless; the controller feeds them the proposal and market snapshot.

use rust_decimal::Decimal;
use std::fmt;
use warden_core::{CheckpointKind, MarketSnapshot, TradeProposal, TradeType, ValidationOutcome};

use crate::config::AdmissionConfig;

/// A checkpoint failure: which checkpoint and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub kind: CheckpointKind,
    pub message: String,
}

impl Denial {
    pub fn new(kind: CheckpointKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl From<Denial> for ValidationOutcome {
    fn from(denial: Denial) -> Self {
        ValidationOutcome::failed(denial.kind, denial.message)
    }
}

pub type CheckResult = std::result::Result<(), Denial>;

/// Validates proposals and market snapshots
pub struct CheckpointValidator;

impl CheckpointValidator {
    /// Checkpoint 3: the proposal is complete and within bounds
    pub fn check_decision_quality(
        symbol: &str,
        trade_type: TradeType,
        proposal: &TradeProposal,
        config: &AdmissionConfig,
    ) -> CheckResult {
        let invalid = |msg: String| Err(Denial::new(CheckpointKind::InvalidProposal, msg));

        // 1. Structure
        if symbol.trim().is_empty() {
            return invalid("Symbol is empty".to_string());
        }
        if proposal.symbol != symbol {
            return invalid(format!(
                "Proposal is for {} but admission was requested for {}",
                proposal.symbol, symbol
            ));
        }
        if proposal.trade_type != trade_type {
            return invalid(format!(
                "Proposal is a {} trade but admission was requested for {}",
                proposal.trade_type, trade_type
            ));
        }

        let missing: Vec<&str> = [
            ("direction", proposal.direction.is_none()),
            ("leverage", proposal.leverage.is_none()),
            ("confidence", proposal.confidence.is_none()),
            (
                "reasoning",
                proposal
                    .reasoning
                    .as_deref()
                    .is_none_or(|r| r.trim().is_empty()),
            ),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return invalid(format!("Missing required fields: {}", missing.join(", ")));
        }

        // 2. Confidence
        let confidence = proposal.confidence.unwrap_or_default();
        if confidence < Decimal::ZERO || confidence > Decimal::ONE_HUNDRED {
            return invalid(format!("Confidence {confidence} outside [0, 100]"));
        }
        if confidence < config.min_confidence {
            return Err(Denial::new(
                CheckpointKind::LowConfidence,
                format!(
                    "Confidence {}% below minimum {}%",
                    confidence, config.min_confidence
                ),
            ));
        }

        // 3. Leverage
        let leverage = proposal.leverage.unwrap_or_default();
        if !leverage.fract().is_zero() {
            return invalid(format!("Leverage {leverage} is not a whole number"));
        }
        let min = Decimal::from(config.min_leverage);
        let max = Decimal::from(config.max_leverage);
        if leverage < min || leverage > max {
            return invalid(format!("Leverage {leverage} outside [{min}, {max}]"));
        }

        // 4. Direction
        if proposal.parsed_direction().is_none() {
            return invalid(format!(
                "Unknown direction {:?}; expected long/short or buy/sell",
                proposal.direction.as_deref().unwrap_or_default()
            ));
        }

        Ok(())
    }

    /// Checkpoint 4: every indicator is finite and within its natural range
    pub fn check_indicators(snapshot: &MarketSnapshot) -> CheckResult {
        let invalid = |msg: String| Err(Denial::new(CheckpointKind::InvalidIndicator, msg));

        let named = [
            ("price", Some(snapshot.price)),
            ("change_pct", snapshot.change_pct),
            ("quote_volume", snapshot.quote_volume),
            ("rsi", snapshot.rsi),
        ];
        for (name, value) in named {
            if let Some(value) = value
                && !value.is_finite()
            {
                return invalid(format!("{name} is not finite ({value})"));
            }
        }
        for (name, value) in &snapshot.indicators {
            if !value.is_finite() {
                return invalid(format!("{name} is not finite ({value})"));
            }
        }

        if snapshot.price <= 0.0 {
            return invalid(format!("Price must be positive, got {}", snapshot.price));
        }
        if let Some(rsi) = snapshot.rsi
            && !(0.0..=100.0).contains(&rsi)
        {
            return invalid(format!("RSI {rsi} outside [0, 100]"));
        }
        if let Some(change) = snapshot.change_pct
            && change <= -100.0
        {
            return invalid(format!("24h change {change}% is not above -100%"));
        }
        if let Some(volume) = snapshot.quote_volume
            && volume < 0.0
        {
            return invalid(format!("Volume {volume} is negative"));
        }

        Ok(())
    }
}
