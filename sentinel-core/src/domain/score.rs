//! Auth integrity score events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Baseline integrity score for every repository
pub const BASELINE_SCORE: f64 = 100.0;

/// One append-only score change, keyed to the scan that produced it.
///
/// The current score is never stored as a bare counter; it is reproduced by
/// replaying every event for a repository from the baseline.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScoreEvent {
    pub scan_id: Uuid,
    pub repo_id: String,
    /// Signed delta; penalties negative, recoveries positive
    pub delta: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Qualitative banding of an integrity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SeverityBand {
    Critical,
    High,
    Medium,
    Low,
}

impl SeverityBand {
    pub fn from_score(score: f64) -> Self {
        if score <= 30.0 {
            Self::Critical
        } else if score <= 60.0 {
            Self::High
        } else if score <= 80.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_sits_in_the_lowest_band() {
        assert_eq!(
            SeverityBand::from_score(crate::domain::BASELINE_SCORE),
            SeverityBand::Low
        );
    }

    #[test]
    fn banding_boundaries() {
        assert_eq!(SeverityBand::from_score(0.0), SeverityBand::Critical);
        assert_eq!(SeverityBand::from_score(30.0), SeverityBand::Critical);
        assert_eq!(SeverityBand::from_score(30.1), SeverityBand::High);
        assert_eq!(SeverityBand::from_score(60.0), SeverityBand::High);
        assert_eq!(SeverityBand::from_score(80.0), SeverityBand::Medium);
        assert_eq!(SeverityBand::from_score(100.0), SeverityBand::Low);
    }
}
