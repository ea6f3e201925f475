//! Vulnerability judgments and consensus verdicts

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::endpoint::EndpointKey;

/// Authorization vulnerability classes tracked by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum VulnerabilityType {
    /// Broken Object Level Authorization
    #[serde(rename = "BOLA")]
    Bola,
    /// Insecure Direct Object Reference
    #[serde(rename = "IDOR")]
    Idor,
    PrivilegeEscalation,
    Other,
}

impl std::fmt::Display for VulnerabilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bola => write!(f, "BOLA"),
            Self::Idor => write!(f, "IDOR"),
            Self::PrivilegeEscalation => write!(f, "Privilege Escalation"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// One model's judgment of one endpoint.
///
/// Owned by the consensus invocation that produced it; persisted only inside
/// its parent verdict's `contributing_models`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelJudgment {
    pub model_id: String,
    /// `None` means the model found no vulnerability, or abstained
    /// (distinguished by `error`)
    pub vulnerability_type: Option<VulnerabilityType>,
    /// 0-100
    pub confidence: u8,
    pub reasoning: String,
    pub latency_ms: u64,
    /// Set when the backend timed out or failed; such a judgment is an
    /// abstention, never a "no vulnerability" vote
    pub error: Option<String>,
}

impl ModelJudgment {
    /// An abstention carries no vote at all
    pub fn is_abstention(&self) -> bool {
        self.error.is_some()
    }

    /// True when the model voted and flagged some vulnerability
    pub fn flags_vulnerability(&self) -> bool {
        !self.is_abstention() && self.vulnerability_type.is_some()
    }

    /// Terminal abstention for a failed backend call
    pub fn abstention(model_id: impl Into<String>, error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            model_id: model_id.into(),
            vulnerability_type: None,
            confidence: 0,
            reasoning: String::new(),
            latency_ms,
            error: Some(error.into()),
        }
    }
}

/// How a verdict was validated during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ValidatedBy {
    /// All voting models agreed on the vulnerability type
    Consensus,
    /// Models disagreed on type; highest-confidence type adopted at a penalty
    MajorityDisputed,
    /// Exactly one model flagged a vulnerability; confidence capped
    SingleModelUnconfirmed,
}

impl std::fmt::Display for ValidatedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Consensus => write!(f, "consensus"),
            Self::MajorityDisputed => write!(f, "majority-disputed"),
            Self::SingleModelUnconfirmed => write!(f, "single-model-unconfirmed"),
        }
    }
}

/// Reconciled vulnerability finding for one endpoint.
///
/// Immutable once persisted; superseded only by re-running a scan.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VulnerabilityVerdict {
    pub id: Uuid,
    pub endpoint_key: EndpointKey,
    pub vulnerability_type: VulnerabilityType,
    /// 0-100, after any disagreement penalty or single-model cap
    pub confidence: f64,
    pub reasoning: String,
    pub contributing_models: Vec<ModelJudgment>,
    pub validated_by: ValidatedBy,
}

impl VulnerabilityVerdict {
    /// True when this verdict alone forces the owning scan to `Blocked`
    pub fn blocks_at(&self, block_threshold: f64) -> bool {
        self.confidence >= block_threshold
    }

    /// Model ids that voted (not abstained) on this verdict
    pub fn voting_models(&self) -> Vec<&str> {
        self.contributing_models
            .iter()
            .filter(|j| !j.is_abstention())
            .map(|j| j.model_id.as_str())
            .collect()
    }
}

/// Outcome of evaluating one endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EndpointVerdict {
    /// Voting models unanimously found no vulnerability
    Clean {
        endpoint_key: EndpointKey,
        /// Mean confidence of the "no vulnerability" votes
        confidence: f64,
        contributing_models: Vec<ModelJudgment>,
    },
    Finding(VulnerabilityVerdict),
    /// Every configured model abstained. Soft state, not an error; the
    /// orchestrator re-attempts before accepting it as final.
    Indeterminate {
        endpoint_key: EndpointKey,
        contributing_models: Vec<ModelJudgment>,
    },
}

impl EndpointVerdict {
    pub fn endpoint_key(&self) -> &EndpointKey {
        match self {
            Self::Clean { endpoint_key, .. } => endpoint_key,
            Self::Finding(v) => &v.endpoint_key,
            Self::Indeterminate { endpoint_key, .. } => endpoint_key,
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::Indeterminate { .. })
    }
}
