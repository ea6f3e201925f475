//! Sentinel Orchestrator - scan lifecycle and HTTP API
//!
//! Drives the full pipeline for each submitted revision: extraction, graph
//! commit and diff, multi-model consensus with drift-aware prioritization,
//! integrity scoring, and the append-only scan ledger. Scans for the same
//! repository are serialized; a newer revision supersedes both the queued
//! and the in-flight scan for its repository.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::scoring::{InMemoryScoreLedger, ScoreLedger, ScoringEngine};
pub use application::use_cases::{GetDashboardUseCase, RunRedTeamUseCase, RunScanUseCase};
pub use domain::ScanError;
pub use infrastructure::scan_queue::{ScanQueueHandle, ScanWorkerContext, spawn_scan_dispatcher};
pub use infrastructure::scan_store::{InMemoryScanRepository, ScanRepository};
pub use presentation::controllers::ApiState;
pub use presentation::routes::{ApiDoc, create_router};
