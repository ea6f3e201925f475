//! Attack simulation artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::endpoint::EndpointKey;

/// Which models' findings a red-team run targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModelScope {
    /// Attack only findings the named model contributed to
    SingleModel { model_id: String },
    /// Attack every model's findings independently, stacking results
    /// without cross-model deduplication
    Combined,
}

/// Qualitative exploitation difficulty reported per attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ExploitationDifficulty {
    Trivial,
    Moderate,
    Hard,
}

/// Result of one simulated attack against one persisted finding.
///
/// Read-only downstream artifact: it never mutates the verdict it targets.
/// Idempotent per `(finding_ref, attack_name, model_source)` - re-running
/// overwrites.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttackSimulationResult {
    /// Verdict this attack targeted
    pub finding_ref: Uuid,
    pub repo_id: String,
    pub target: EndpointKey,
    pub attack_name: String,
    pub attack_description: String,
    pub attack_successful: bool,
    pub exploitation_difficulty: ExploitationDifficulty,
    /// Model whose finding was attacked ("combined" runs tag each result
    /// with the individual source model)
    pub model_source: String,
    /// 0-100, exploitability confidence from the assessing backend
    pub confidence: u8,
    pub reasoning: String,
    pub simulated_at: DateTime<Utc>,
}

/// Summary statistics for one red-team run
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RedTeamSummary {
    pub findings_analyzed: usize,
    pub attacks_simulated: usize,
    pub successful_attacks: usize,
    /// Successful attacks against BOLA or privilege escalation findings
    pub high_risk: usize,
}

/// Full report of one red-team run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedTeamReport {
    pub repo_id: String,
    pub model_scope: ModelScope,
    pub summary: RedTeamSummary,
    pub results: Vec<AttackSimulationResult>,
    pub generated_at: DateTime<Utc>,
}
