//! Trading Core - owned admission pipeline built once at startup
//!
//! Replaces process-wide singletons: one breaker, one rebalancer and one
//! admission controller, shared by `Arc` with the control loop.

use log::info;
use std::fs;
use std::sync::Arc;
use warden_admission::AdmissionController;
use warden_circuit_breaker::CircuitBreaker;
use warden_core::Amount;
use warden_ports::{Clock, DecisionSource, ExchangeGateway};
use warden_rebalancer::CapitalRebalancer;

use crate::config::CoreConfig;
use crate::error::{Result, RunnerError};
use crate::periodic::PeriodicRebalance;

pub struct TradingCore {
    config: CoreConfig,
    breaker: Arc<CircuitBreaker>,
    rebalancer: Arc<CapitalRebalancer>,
    admission: Arc<AdmissionController>,
}

impl TradingCore {
    /// Load persisted state from `config.state_dir` and wire the pipeline
    pub fn bootstrap(
        config: CoreConfig,
        gateway: Arc<dyn ExchangeGateway>,
        decision_source: Arc<dyn DecisionSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        fs::create_dir_all(&config.state_dir).map_err(|source| RunnerError::StateDir {
            path: config.state_dir.clone(),
            source,
        })?;

        let breaker = Arc::new(CircuitBreaker::open(&config.state_dir, clock.clone())?);
        let rebalancer = Arc::new(CapitalRebalancer::open(
            gateway.clone(),
            clock.clone(),
            config.rebalancer.clone(),
            &config.state_dir,
        )?);
        let admission = Arc::new(
            AdmissionController::new(
                gateway.clone(),
                decision_source.clone(),
                clock.clone(),
                config.admission.clone(),
            )?
            .with_circuit_breaker(breaker.clone())
            .with_rebalancer(rebalancer.clone()),
        );

        info!(
            "[RISK] Trading core ready: state in {}, gateway {}, decision source {}, clock {}",
            config.state_dir.display(),
            gateway.name(),
            decision_source.name(),
            clock.name()
        );

        Ok(Self {
            config,
            breaker,
            rebalancer,
            admission,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn breaker(&self) -> Arc<CircuitBreaker> {
        self.breaker.clone()
    }

    pub fn rebalancer(&self) -> Arc<CapitalRebalancer> {
        self.rebalancer.clone()
    }

    pub fn admission(&self) -> Arc<AdmissionController> {
        self.admission.clone()
    }

    /// Start the background allocation rebalance
    pub fn spawn_periodic_rebalance(&self) -> PeriodicRebalance {
        PeriodicRebalance::spawn(self.rebalancer.clone(), self.config.rebalance_tick)
    }

    /// Measure total capital across venues and make it today's loss baseline
    pub async fn refresh_daily_start_balance(&self) -> Result<Amount> {
        let total = self.rebalancer.fetch_allocation().await?.total();
        self.breaker.set_daily_start_balance(total)?;
        Ok(total)
    }
}
