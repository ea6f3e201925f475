//! Shared domain model
//!
//! Types produced by one pipeline stage and consumed by another live here;
//! types private to a single stage live in that stage's crate.

pub mod endpoint;
pub mod graph;
pub mod redteam;
pub mod scan;
pub mod score;
pub mod source;
pub mod verdict;

pub use endpoint::{DYNAMIC_PATH, Endpoint, EndpointKey, ParamDescriptor};
pub use graph::GraphDelta;
pub use redteam::{
    AttackSimulationResult, ExploitationDifficulty, ModelScope, RedTeamReport, RedTeamSummary,
};
pub use scan::{ScanRecord, ScanStatus};
pub use score::{BASELINE_SCORE, ScoreEvent, SeverityBand};
pub use source::{SourceFile, SourceRevision};
pub use verdict::{
    EndpointVerdict, ModelJudgment, ValidatedBy, VulnerabilityType, VulnerabilityVerdict,
};
