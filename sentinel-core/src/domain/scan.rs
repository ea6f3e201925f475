//! Scan records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::endpoint::EndpointKey;
use super::graph::GraphDelta;
use super::verdict::VulnerabilityVerdict;

/// Terminal status of one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// No verdict reached the block threshold
    Passed,
    /// At least one verdict at or above the block threshold
    Blocked,
    /// Infrastructure failure (extraction or graph consistency), not a
    /// security finding. Excluded from the integrity score.
    Errored,
    /// A newer revision arrived before this scan finished; its result is
    /// retained for audit but excluded from the latest score.
    Superseded,
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Blocked => write!(f, "blocked"),
            Self::Errored => write!(f, "errored"),
            Self::Superseded => write!(f, "superseded"),
        }
    }
}

/// Append-only record of one completed orchestrator run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanRecord {
    pub scan_id: Uuid,
    pub repo_id: String,
    pub revision_sha: String,
    pub status: ScanStatus,
    pub findings: Vec<VulnerabilityVerdict>,
    /// Endpoints on which every model abstained twice. Soft findings,
    /// zero score contribution.
    pub indeterminate: Vec<EndpointKey>,
    /// Drift computed against the previous snapshot, cached for reporting
    pub drift: GraphDelta,
    /// Signed change applied to the integrity score by this scan
    pub score_delta: f64,
    /// Infrastructure error message for `Errored` scans
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScanRecord {
    /// Errored and superseded scans never contribute to the score
    pub fn contributes_to_score(&self) -> bool {
        matches!(self.status, ScanStatus::Passed | ScanStatus::Blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errored_and_superseded_excluded_from_score() {
        let record = |status| ScanRecord {
            scan_id: Uuid::new_v4(),
            repo_id: "acme/shop".into(),
            revision_sha: "abc".into(),
            status,
            findings: vec![],
            indeterminate: vec![],
            drift: GraphDelta::default(),
            score_delta: 0.0,
            error: None,
            created_at: Utc::now(),
        };
        assert!(record(ScanStatus::Passed).contributes_to_score());
        assert!(record(ScanStatus::Blocked).contributes_to_score());
        assert!(!record(ScanStatus::Errored).contributes_to_score());
        assert!(!record(ScanStatus::Superseded).contributes_to_score());
    }
}
