//! Inference adapter capability

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sentinel_core::domain::{
    Endpoint, EndpointKey, ExploitationDifficulty, VulnerabilityType,
};

use super::error::InferenceError;

/// Metadata about a configured backend
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    /// Stable identifier used in judgments and reports (e.g. "qwen")
    pub id: String,
    /// Model name submitted with requests, for audit
    pub model: String,
}

/// Everything a backend needs to judge one endpoint
#[derive(Debug, Clone, Serialize)]
pub struct JudgmentRequest {
    pub endpoint_key: EndpointKey,
    pub handler_name: String,
    pub declared_guards: Vec<String>,
    pub parameters: Vec<String>,
    pub handler_source: String,
    /// Drift context ("guard verify_token removed since prior revision"),
    /// when the graph diff flagged this route
    pub drift_note: Option<String>,
}

impl JudgmentRequest {
    pub fn from_endpoint(endpoint: &Endpoint) -> Self {
        Self {
            endpoint_key: endpoint.key(),
            handler_name: endpoint.handler_name.clone(),
            declared_guards: endpoint.declared_guards.iter().cloned().collect(),
            parameters: endpoint.parameters.iter().map(|p| p.name.clone()).collect(),
            handler_source: endpoint.handler_source.clone(),
            drift_note: None,
        }
    }

    pub fn with_drift_note(mut self, note: impl Into<String>) -> Self {
        self.drift_note = Some(note.into());
        self
    }
}

/// Structured judgment a backend must produce.
///
/// Matches the JSON schema the detection prompt demands; the wire value
/// `"None"` for `vulnerability_type` means an explicit "no vulnerability"
/// vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentPayload {
    pub has_vulnerability: bool,
    #[serde(default)]
    pub vulnerability_type: Option<String>,
    pub confidence: u8,
    #[serde(default)]
    pub reasoning: String,
}

impl JudgmentPayload {
    /// Explicit "no vulnerability" vote at the given confidence
    pub fn clean(confidence: u8) -> Self {
        Self {
            has_vulnerability: false,
            vulnerability_type: None,
            confidence,
            reasoning: String::new(),
        }
    }

    /// A flagged vulnerability
    pub fn finding(
        vulnerability_type: VulnerabilityType,
        confidence: u8,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            has_vulnerability: true,
            vulnerability_type: Some(vulnerability_type.to_string()),
            confidence,
            reasoning: reasoning.into(),
        }
    }

    /// Normalize the backend's free-form type string into the taxonomy.
    /// Unknown non-empty types become `Other` rather than being dropped.
    pub fn resolved_type(&self) -> Option<VulnerabilityType> {
        if !self.has_vulnerability {
            return None;
        }
        let raw = self.vulnerability_type.as_deref().unwrap_or("").trim();
        let lowered = raw.to_lowercase();
        if lowered.is_empty() || lowered == "none" {
            return None;
        }
        if lowered.contains("idor") || lowered.contains("insecure direct") {
            Some(VulnerabilityType::Idor)
        } else if lowered.contains("bola") || lowered.contains("object level") {
            Some(VulnerabilityType::Bola)
        } else if lowered.contains("privilege") || lowered.contains("escalation") {
            Some(VulnerabilityType::PrivilegeEscalation)
        } else {
            Some(VulnerabilityType::Other)
        }
    }
}

/// One candidate attack submitted for an exploitability assessment
#[derive(Debug, Clone, Serialize)]
pub struct ExploitProbe {
    pub attack_name: String,
    pub attack_description: String,
    pub endpoint_key: EndpointKey,
    /// Guard state of the target route at finding time
    pub declared_guards: Vec<String>,
    pub vulnerability_type: VulnerabilityType,
    /// Reasoning from the verdict being attacked
    pub finding_reasoning: String,
}

/// Backend's exploitability assessment for one probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploitAssessment {
    pub attack_successful: bool,
    pub exploitation_difficulty: ExploitationDifficulty,
    pub confidence: u8,
    #[serde(default)]
    pub reasoning: String,
}

/// Uniform capability for a named reasoning backend.
///
/// Object-safe; used behind `Arc<dyn InferenceAdapter>`. Implementations
/// may fail with [`InferenceError`]; timeout, retry, and abstention policy
/// is layered on by [`crate::ResilientAdapter`], not implemented here.
#[async_trait]
pub trait InferenceAdapter: Send + Sync {
    fn info(&self) -> AdapterInfo;

    /// Judge one endpoint for authorization vulnerabilities
    async fn judge(&self, request: &JudgmentRequest) -> Result<JudgmentPayload, InferenceError>;

    /// Judge the exploitability of one candidate attack against a finding
    async fn assess_exploit(
        &self,
        probe: &ExploitProbe,
    ) -> Result<ExploitAssessment, InferenceError>;
}
