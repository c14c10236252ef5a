//! Transfer History
//!
//! Append-only, bounded log of transfer attempts. Successful records are the
//! only source for per-venue cooldowns, so the log is reloaded on start.

use log::error;
use std::collections::VecDeque;
use std::path::Path;
use warden_core::{TransferKind, TransferRecord, Venue};
use warden_store::{JsonDocument, StoreResult};

/// File holding the transfer log
pub const HISTORY_FILE: &str = "transfer_history.json";

pub struct TransferHistory {
    records: VecDeque<TransferRecord>,
    capacity: usize,
    document: Option<JsonDocument<Vec<TransferRecord>>>,
}

impl TransferHistory {
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            document: None,
        }
    }

    /// Load `transfer_history.json` from `state_dir`. Unreadable files start empty.
    pub fn open(state_dir: impl AsRef<Path>, capacity: usize) -> Self {
        let document = JsonDocument::new(state_dir.as_ref().join(HISTORY_FILE));
        let mut loaded = document.load_or_else(Vec::new);
        if loaded.len() > capacity {
            loaded.drain(..loaded.len() - capacity);
        }
        Self {
            records: loaded.into(),
            capacity,
            document: Some(document),
        }
    }

    /// Append a record, dropping the oldest beyond capacity, and persist.
    ///
    /// The record stays in memory even if the write fails.
    pub fn push(&mut self, record: TransferRecord) -> StoreResult<()> {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
        self.save()
    }

    /// Append and log a persistence failure instead of returning it
    pub fn push_logged(&mut self, record: TransferRecord) {
        if let Err(e) = self.push(record) {
            error!("[REBALANCE] Failed to persist transfer history: {}", e);
        }
    }

    /// Most recent successful transfer into `venue`
    pub fn last_success_to(&self, venue: Venue) -> Option<&TransferRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.is_success() && r.to_venue == venue)
    }

    /// Most recent successful transfer of a given kind
    pub fn last_success_of(&self, kind: TransferKind) -> Option<&TransferRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.is_success() && r.kind == kind)
    }

    pub fn records(&self) -> Vec<TransferRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn save(&self) -> StoreResult<()> {
        match &self.document {
            Some(document) => {
                let records: Vec<TransferRecord> = self.records.iter().cloned().collect();
                document.save(&records)
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use warden_core::Timestamp;

    fn at(minutes: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn success(minutes: i64, to: Venue) -> TransferRecord {
        TransferRecord::succeeded(
            at(minutes),
            dec!(50),
            Venue::Spot,
            to,
            TransferKind::OnDemand,
            Some(format!("tx-{minutes}")),
        )
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = TransferHistory::in_memory(3);
        for i in 0..5 {
            history.push(success(i, Venue::Futures)).unwrap();
        }

        let records = history.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].timestamp, at(2));
        assert_eq!(records[2].timestamp, at(4));
    }

    #[test]
    fn test_last_success_skips_failures() {
        let mut history = TransferHistory::in_memory(10);
        history.push(success(0, Venue::Margin)).unwrap();
        history
            .push(TransferRecord::failed(
                at(5),
                dec!(50),
                Venue::Spot,
                Venue::Margin,
                TransferKind::OnDemand,
                "timeout",
            ))
            .unwrap();

        let last = history.last_success_to(Venue::Margin).unwrap();
        assert_eq!(last.timestamp, at(0));
        assert!(history.last_success_to(Venue::Futures).is_none());
        assert!(history.last_success_of(TransferKind::Rebalance).is_none());
    }

    #[test]
    fn test_reload_truncates_to_capacity() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut history = TransferHistory::open(dir.path(), 10);
            for i in 0..6 {
                history.push(success(i, Venue::Futures)).unwrap();
            }
        }

        let reloaded = TransferHistory::open(dir.path(), 4);
        assert_eq!(reloaded.len(), 4);
        assert_eq!(
            reloaded.last_success_to(Venue::Futures).unwrap().timestamp,
            at(5)
        );
    }
}
