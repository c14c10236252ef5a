//! Periodic allocation rebalance
//!
//! Runs off the trade path: the admission controller never waits on it.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use warden_rebalancer::{CapitalRebalancer, RebalanceError};

/// Handle to the background rebalance task; the task stops when this is dropped
pub struct PeriodicRebalance {
    handle: JoinHandle<()>,
}

impl PeriodicRebalance {
    /// Spawn the task. The first pass runs immediately, then once per `tick`.
    pub fn spawn(rebalancer: Arc<CapitalRebalancer>, tick: Duration) -> Self {
        info!("[REBALANCE] Periodic rebalance every {}s", tick.as_secs());
        let handle = tokio::spawn(async move {
            let mut ticker = interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                run_once(&rebalancer).await;
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for PeriodicRebalance {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One rebalance pass; every outcome is logged, none is fatal
pub async fn run_once(rebalancer: &CapitalRebalancer) {
    match rebalancer.rebalance_allocation().await {
        Ok(Some(record)) => info!(
            "[REBALANCE] Periodic transfer {} {} -> {}",
            record.amount, record.from_venue, record.to_venue
        ),
        Ok(None) => debug!("[REBALANCE] Periodic pass: nothing to do"),
        Err(e @ RebalanceError::Cooldown { .. }) => {
            debug!("[REBALANCE] Periodic pass deferred: {}", e)
        }
        Err(e) => warn!("[REBALANCE] Periodic pass failed: {}", e),
    }
}
