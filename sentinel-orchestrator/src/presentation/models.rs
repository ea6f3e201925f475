//! API request and response models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use sentinel_core::domain::{ModelScope, ScanRecord, SeverityBand, SourceFile, SourceRevision};

/// Request model for scan submission
#[derive(Deserialize, ToSchema)]
pub struct SubmitScanRequest {
    /// Repository identifier
    #[schema(example = "acme/shop")]
    pub repo_id: String,

    /// Revision being scanned
    #[schema(example = "7f3a9c1")]
    pub revision_sha: String,

    /// Source files of the revision
    pub files: Vec<SourceFileModel>,
}

/// One source file in a scan submission
#[derive(Deserialize, ToSchema)]
pub struct SourceFileModel {
    #[schema(example = "app/routes/orders.py")]
    pub path: String,
    pub content: String,
}

impl SubmitScanRequest {
    pub fn into_revision(self) -> SourceRevision {
        SourceRevision {
            repo_id: self.repo_id,
            revision_sha: self.revision_sha,
            files: self
                .files
                .into_iter()
                .map(|f| SourceFile {
                    path: f.path,
                    content: f.content,
                })
                .collect(),
        }
    }
}

/// Response model for scan submission
#[derive(Serialize, ToSchema)]
pub struct SubmitScanResponse {
    /// Scan id for tracking
    pub scan_id: Uuid,
    #[schema(example = "queued")]
    pub status: String,
}

/// Scan history for one repository, newest first
#[derive(Serialize, ToSchema)]
pub struct ScanListResponse {
    pub repo_id: String,
    pub scans: Vec<ScanRecord>,
}

/// Dashboard state for one repository
#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub repo_id: String,
    /// Current auth integrity score, 0-100
    #[schema(example = 76.0)]
    pub score: f64,
    pub severity_band: SeverityBand,
    /// Guard-removal drift events inside the reporting window
    pub drift_events_in_window: usize,
    /// Reporting window in hours
    #[schema(example = 24)]
    pub window_hours: i64,
    /// Successful simulated attacks recorded against this repository
    pub exploits_prevented_count: usize,
    pub total_scans: usize,
    pub last_scan: Option<ScanRecord>,
}

/// Request model for a red-team run
#[derive(Deserialize, ToSchema)]
pub struct RedTeamRequest {
    #[schema(example = "acme/shop")]
    pub repo_id: String,
    /// `"combined"` or `{"single_model": {"model_id": "..."}}`
    pub model_scope: ModelScope,
}

/// Error body returned by every failing endpoint
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "invalid_request")]
    pub error: String,
    pub message: String,
}
