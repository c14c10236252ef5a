use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use warden_ports::{DecisionSource, GatewayError, GatewayResult};

/// Decision source stand-in whose health is toggled by hand
pub struct PaperDecisionSource {
    name: String,
    healthy: AtomicBool,
    latency_ms: AtomicU64,
    probes: AtomicU64,
}

impl PaperDecisionSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
            probes: AtomicU64::new(0),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Delay each health check (used to trip caller timeouts)
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Health checks answered so far
    pub fn probe_count(&self) -> u64 {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionSource for PaperDecisionSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn health_check(&self) -> GatewayResult<()> {
        self.probes.fetch_add(1, Ordering::SeqCst);

        let latency_ms = self.latency_ms.load(Ordering::SeqCst);
        if latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(latency_ms)).await;
        }
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GatewayError::Unavailable(format!("{} is not responding", self.name)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_toggle() {
        let source = PaperDecisionSource::new("llm");
        assert!(source.health_check().await.is_ok());

        source.set_healthy(false);
        let err = source.health_check().await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(source.probe_count(), 2);
    }
}
