//! Orchestrator domain types

use uuid::Uuid;

use sentinel_core::domain::SourceRevision;
use sentinel_extract::ExtractionError;
use sentinel_graph::GraphError;

/// A submitted revision waiting for its worker slot
#[derive(Debug, Clone)]
pub struct QueuedScan {
    pub scan_id: Uuid,
    pub revision: SourceRevision,
}

/// Infrastructure failure during a scan.
///
/// These produce `Errored` scan records and never touch the integrity
/// score; a broken pipeline must not look like a security regression.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Scan storage error: {0}")]
    Storage(String),
}
