use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a proposal was denied. All kinds are informational: a denial is a
/// normal result, never an error for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CheckpointKind {
    /// Circuit breaker refused the trade
    RiskLimit,
    /// A venue or the decision source failed its health probe
    DependencyUnhealthy,
    /// Venue balance still short after one remediation attempt
    InsufficientCapital,
    /// Proposal is structurally invalid
    InvalidProposal,
    /// Proposal confidence below the configured minimum
    LowConfidence,
    /// A market indicator is out of range or not finite
    InvalidIndicator,
    /// Symbol was admitted too recently
    OnCooldown,
}

impl CheckpointKind {
    pub const ALL: [CheckpointKind; 7] = [
        CheckpointKind::RiskLimit,
        CheckpointKind::DependencyUnhealthy,
        CheckpointKind::InsufficientCapital,
        CheckpointKind::InvalidProposal,
        CheckpointKind::LowConfidence,
        CheckpointKind::InvalidIndicator,
        CheckpointKind::OnCooldown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointKind::RiskLimit => "RiskLimit",
            CheckpointKind::DependencyUnhealthy => "DependencyUnhealthy",
            CheckpointKind::InsufficientCapital => "InsufficientCapital",
            CheckpointKind::InvalidProposal => "InvalidProposal",
            CheckpointKind::LowConfidence => "LowConfidence",
            CheckpointKind::InvalidIndicator => "InvalidIndicator",
            CheckpointKind::OnCooldown => "OnCooldown",
        }
    }
}

impl fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approve/deny decision with a human-readable reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub approved: bool,
    pub reason: String,
    /// Set on denials raised by a checkpoint
    #[serde(default)]
    pub failure: Option<CheckpointKind>,
}

impl ValidationOutcome {
    pub fn approved(reason: impl Into<String>) -> Self {
        Self {
            approved: true,
            reason: reason.into(),
            failure: None,
        }
    }

    /// Denial without a checkpoint kind (e.g. raised by the circuit breaker itself)
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: reason.into(),
            failure: None,
        }
    }

    pub fn failed(kind: CheckpointKind, reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: reason.into(),
            failure: Some(kind),
        }
    }

    pub fn is_denied(&self) -> bool {
        !self.approved
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.approved, self.failure) {
            (true, _) => write!(f, "approved: {}", self.reason),
            (false, Some(kind)) => write!(f, "denied [{}]: {}", kind, self.reason),
            (false, None) => write!(f, "denied: {}", self.reason),
        }
    }
}
