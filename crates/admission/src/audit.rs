//! Failure audit log: bounded record of denials plus per-kind counters

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use warden_core::{CheckpointKind, Symbol, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub timestamp: Timestamp,
    pub symbol: Symbol,
    pub kind: CheckpointKind,
    pub message: String,
}

struct Inner {
    records: VecDeque<FailureRecord>,
    counts: BTreeMap<CheckpointKind, u64>,
}

pub struct AuditLog {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                records: VecDeque::with_capacity(capacity),
                counts: BTreeMap::new(),
            }),
        }
    }

    pub fn record(&self, record: FailureRecord) {
        let mut inner = self.inner.lock();
        *inner.counts.entry(record.kind).or_insert(0) += 1;
        while inner.records.len() >= self.capacity {
            inner.records.pop_front();
        }
        inner.records.push_back(record);
    }

    /// Failures per kind since start; counters are never trimmed
    pub fn counts(&self) -> BTreeMap<CheckpointKind, u64> {
        self.inner.lock().counts.clone()
    }

    pub fn count(&self, kind: CheckpointKind) -> u64 {
        self.inner.lock().counts.get(&kind).copied().unwrap_or(0)
    }

    /// Up to `n` most recent failures, oldest first
    pub fn recent(&self, n: usize) -> Vec<FailureRecord> {
        let inner = self.inner.lock();
        let skip = inner.records.len().saturating_sub(n);
        inner.records.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
