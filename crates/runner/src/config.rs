//! Core configuration

use std::path::PathBuf;
use std::time::Duration;
use warden_admission::AdmissionConfig;
use warden_rebalancer::RebalancerConfig;

/// Everything needed to bootstrap the admission core.
///
/// Risk limits are not here: they live in `risk_config.json` inside
/// `state_dir` so that they can be edited without a rebuild.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory holding the risk config, risk state and transfer history
    pub state_dir: PathBuf,
    pub admission: AdmissionConfig,
    pub rebalancer: RebalancerConfig,
    /// How often the periodic rebalance task wakes up
    pub rebalance_tick: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("state"),
            admission: AdmissionConfig::default(),
            rebalancer: RebalancerConfig::default(),
            rebalance_tick: Duration::from_secs(15 * 60),
        }
    }
}

impl CoreConfig {
    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = state_dir.into();
        self
    }
}
