use serde::{Deserialize, Serialize};

use super::Venue;
use crate::values::{Amount, Timestamp};

/// Outcome of a transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Success,
    Failed,
}

/// Why a transfer was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Funding a venue ahead of a trade
    #[default]
    OnDemand,
    /// Sweeping margin/futures back to spot
    Consolidation,
    /// Periodic target-allocation correction
    Rebalance,
}

/// One transfer attempt between venues.
///
/// Records are appended once and never mutated; the history of successful
/// records is the only source for per-venue transfer cooldowns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub timestamp: Timestamp,
    pub amount: Amount,
    pub from_venue: Venue,
    pub to_venue: Venue,
    pub status: TransferStatus,
    #[serde(default)]
    pub kind: TransferKind,
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Failure detail, if any
    #[serde(default)]
    pub error: Option<String>,
}

impl TransferRecord {
    pub fn succeeded(
        timestamp: Timestamp,
        amount: Amount,
        from_venue: Venue,
        to_venue: Venue,
        kind: TransferKind,
        transaction_id: Option<String>,
    ) -> Self {
        Self {
            timestamp,
            amount,
            from_venue,
            to_venue,
            status: TransferStatus::Success,
            kind,
            transaction_id,
            error: None,
        }
    }

    pub fn failed(
        timestamp: Timestamp,
        amount: Amount,
        from_venue: Venue,
        to_venue: Venue,
        kind: TransferKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            amount,
            from_venue,
            to_venue,
            status: TransferStatus::Failed,
            kind,
            transaction_id: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TransferStatus::Success
    }
}

/// Gateway acknowledgement of a transfer request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub success: bool,
    pub transaction_id: Option<String>,
}

impl TransferReceipt {
    pub fn accepted(transaction_id: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction_id.into()),
        }
    }

    pub fn rejected() -> Self {
        Self {
            success: false,
            transaction_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_serialization_shape() {
        let record = TransferRecord::succeeded(
            Utc::now(),
            dec!(50),
            Venue::Spot,
            Venue::Futures,
            TransferKind::OnDemand,
            Some("tx-1".to_string()),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["from_venue"], "spot");
        assert_eq!(value["to_venue"], "futures");
        assert_eq!(value["status"], "success");
        assert_eq!(value["kind"], "on_demand");
    }

    #[test]
    fn test_legacy_record_without_kind() {
        let json = r#"{"timestamp":"2026-01-02T03:04:05Z","amount":"50","from_venue":"spot","to_venue":"margin","status":"failed"}"#;
        let record: TransferRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, TransferKind::OnDemand);
        assert!(!record.is_success());
    }
}
