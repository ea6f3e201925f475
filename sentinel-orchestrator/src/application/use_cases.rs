//! Scan orchestration use cases

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use sentinel_core::config::ScanConfig;
use sentinel_core::domain::{
    Endpoint, EndpointKey, EndpointVerdict, GraphDelta, ScanRecord, ScanStatus, SeverityBand,
    SourceRevision, VulnerabilityVerdict,
};
use sentinel_core::domain::{ModelScope, RedTeamReport};
use sentinel_extract::ExtractEndpointsUseCase;
use sentinel_graph::GraphStore;
use sentinel_llm::ConsensusEngine;
use sentinel_redteam::application::simulator::{AttackSimulationEngine, FindingContext};
use sentinel_redteam::AttackResultRepository;

use crate::application::scoring::ScoringEngine;
use crate::domain::ScanError;
use crate::infrastructure::scan_store::ScanRepository;

/// Runs one scan end to end: extraction, graph commit and diff, consensus
/// evaluation, scoring, and record persistence.
///
/// Pipeline failures produce an `Errored` record instead of propagating;
/// only storage failures escape as errors.
pub struct RunScanUseCase {
    extractor: ExtractEndpointsUseCase,
    graph_store: Arc<dyn GraphStore>,
    consensus: Arc<ConsensusEngine>,
    scoring: Arc<ScoringEngine>,
    scans: Arc<dyn ScanRepository>,
    config: ScanConfig,
}

impl RunScanUseCase {
    pub fn new(
        extractor: ExtractEndpointsUseCase,
        graph_store: Arc<dyn GraphStore>,
        consensus: Arc<ConsensusEngine>,
        scoring: Arc<ScoringEngine>,
        scans: Arc<dyn ScanRepository>,
        config: ScanConfig,
    ) -> Self {
        Self {
            extractor,
            graph_store,
            consensus,
            scoring,
            scans,
            config,
        }
    }

    /// Execute one scan. The `superseded` flag is shared with the queue;
    /// when a newer revision for the same repository arrives mid-scan the
    /// queue raises it and this scan finishes as `Superseded` without
    /// touching the score.
    pub async fn execute(
        &self,
        scan_id: Uuid,
        revision: SourceRevision,
        superseded: Arc<AtomicBool>,
    ) -> Result<ScanRecord, ScanError> {
        let repo_id = revision.repo_id.clone();
        let revision_sha = revision.revision_sha.clone();

        info!(
            repo_id = %repo_id,
            revision_sha = %revision_sha,
            scan_id = %scan_id,
            "Starting scan"
        );

        if superseded.load(Ordering::SeqCst) {
            return self
                .persist_superseded(scan_id, &repo_id, &revision_sha, Vec::new(), Vec::new(), GraphDelta::default())
                .await;
        }

        let endpoints = match self.extractor.execute(&revision) {
            Ok(endpoints) => endpoints,
            Err(e) => {
                error!(repo_id = %repo_id, error = %e, "Extraction failed");
                return self.persist_errored(scan_id, &repo_id, &revision_sha, e.to_string()).await;
            }
        };

        let parent = self.graph_store.latest(&repo_id).await;
        if let Err(e) = self
            .graph_store
            .commit_snapshot(&repo_id, &revision_sha, &endpoints)
            .await
        {
            error!(repo_id = %repo_id, error = %e, "Snapshot commit failed");
            return self.persist_errored(scan_id, &repo_id, &revision_sha, e.to_string()).await;
        }

        let drift = match self
            .graph_store
            .diff(&repo_id, parent.as_deref(), &revision_sha)
            .await
        {
            Ok(drift) => drift,
            Err(e) => {
                error!(repo_id = %repo_id, error = %e, "Graph diff failed");
                return self.persist_errored(scan_id, &repo_id, &revision_sha, e.to_string()).await;
            }
        };

        if drift.drift_count() > 0 {
            warn!(
                repo_id = %repo_id,
                drifted_routes = drift.drift_count(),
                "Authorization drift detected"
            );
        }

        let ordered = prioritize(endpoints, &drift);
        let mut findings: Vec<VulnerabilityVerdict> = Vec::new();
        let mut indeterminate: Vec<EndpointKey> = Vec::new();

        for endpoint in &ordered {
            if superseded.load(Ordering::SeqCst) {
                return self
                    .persist_superseded(
                        scan_id,
                        &repo_id,
                        &revision_sha,
                        findings,
                        indeterminate,
                        drift.clone(),
                    )
                    .await;
            }

            let verdict = self.evaluate_with_retry(endpoint, &drift).await;
            match verdict {
                EndpointVerdict::Finding(finding) => findings.push(finding),
                EndpointVerdict::Indeterminate { endpoint_key, .. } => {
                    warn!(endpoint = %endpoint_key, "Endpoint indeterminate after retries");
                    indeterminate.push(endpoint_key);
                }
                EndpointVerdict::Clean { .. } => {}
            }
        }

        if superseded.load(Ordering::SeqCst) {
            return self
                .persist_superseded(scan_id, &repo_id, &revision_sha, findings, indeterminate, drift)
                .await;
        }

        let threshold = self.consensus.block_threshold();
        let status = if findings.iter().any(|f| f.blocks_at(threshold)) {
            ScanStatus::Blocked
        } else {
            ScanStatus::Passed
        };

        let delta = self.scoring.scan_delta(&findings, &drift, threshold);
        self.scoring.record(scan_id, &repo_id, delta).await;

        let record = ScanRecord {
            scan_id,
            repo_id: repo_id.clone(),
            revision_sha,
            status,
            findings,
            indeterminate,
            drift,
            score_delta: delta,
            error: None,
            created_at: Utc::now(),
        };
        self.scans.append(record.clone()).await?;

        info!(
            repo_id = %repo_id,
            scan_id = %scan_id,
            status = %record.status,
            findings = record.findings.len(),
            score_delta = record.score_delta,
            "Scan complete"
        );
        Ok(record)
    }

    /// Evaluate one endpoint, re-attempting when every model abstains.
    /// An indeterminate outcome after the retry budget stands as-is.
    async fn evaluate_with_retry(&self, endpoint: &Endpoint, drift: &GraphDelta) -> EndpointVerdict {
        let key = endpoint.key();
        let drift_note = if drift.routes_with_removed_guards.contains(&key) {
            Some(
                "At least one authorization guard was removed from this route since the previous revision."
                    .to_string(),
            )
        } else {
            None
        };

        let mut verdict = self.consensus.evaluate(endpoint, drift_note.clone()).await;
        for _ in 0..self.config.indeterminate_retries {
            if !verdict.is_indeterminate() {
                break;
            }
            verdict = self.consensus.evaluate(endpoint, drift_note.clone()).await;
        }
        verdict
    }

    async fn persist_errored(
        &self,
        scan_id: Uuid,
        repo_id: &str,
        revision_sha: &str,
        error: String,
    ) -> Result<ScanRecord, ScanError> {
        let record = ScanRecord {
            scan_id,
            repo_id: repo_id.to_string(),
            revision_sha: revision_sha.to_string(),
            status: ScanStatus::Errored,
            findings: Vec::new(),
            indeterminate: Vec::new(),
            drift: GraphDelta::default(),
            score_delta: 0.0,
            error: Some(error),
            created_at: Utc::now(),
        };
        self.scans.append(record.clone()).await?;
        Ok(record)
    }

    async fn persist_superseded(
        &self,
        scan_id: Uuid,
        repo_id: &str,
        revision_sha: &str,
        findings: Vec<VulnerabilityVerdict>,
        indeterminate: Vec<EndpointKey>,
        drift: GraphDelta,
    ) -> Result<ScanRecord, ScanError> {
        info!(repo_id = %repo_id, scan_id = %scan_id, "Scan superseded by a newer revision");
        let record = ScanRecord {
            scan_id,
            repo_id: repo_id.to_string(),
            revision_sha: revision_sha.to_string(),
            status: ScanStatus::Superseded,
            findings,
            indeterminate,
            drift,
            score_delta: 0.0,
            error: None,
            created_at: Utc::now(),
        };
        self.scans.append(record.clone()).await?;
        Ok(record)
    }
}

/// Order endpoints so the consensus engine sees the riskiest first:
/// drifted and newly added routes, then ungoverned or dynamic routes,
/// then the rest, each tier in key order.
fn prioritize(mut endpoints: Vec<Endpoint>, drift: &GraphDelta) -> Vec<Endpoint> {
    endpoints.sort_by(|a, b| {
        let rank = |e: &Endpoint| {
            let key = e.key();
            if drift.mandates_evaluation(&key) {
                0
            } else if e.is_ungoverned() || e.is_dynamic() {
                1
            } else {
                2
            }
        };
        rank(a).cmp(&rank(b)).then_with(|| a.key().cmp(&b.key()))
    });
    endpoints
}

/// Dashboard aggregation for one repository
pub struct GetDashboardUseCase {
    scans: Arc<dyn ScanRepository>,
    scoring: Arc<ScoringEngine>,
    attack_results: Arc<dyn AttackResultRepository>,
    window_hours: i64,
}

/// Aggregated dashboard state
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub repo_id: String,
    pub score: f64,
    pub severity_band: SeverityBand,
    pub drift_events_in_window: usize,
    pub window_hours: i64,
    pub exploits_prevented: usize,
    pub total_scans: usize,
    pub last_scan: Option<ScanRecord>,
}

impl GetDashboardUseCase {
    pub fn new(
        scans: Arc<dyn ScanRepository>,
        scoring: Arc<ScoringEngine>,
        attack_results: Arc<dyn AttackResultRepository>,
        config: &ScanConfig,
    ) -> Self {
        Self {
            scans,
            scoring,
            attack_results,
            window_hours: config.dashboard_window_hours as i64,
        }
    }

    pub async fn execute(&self, repo_id: &str) -> Result<DashboardData, ScanError> {
        let score = self.scoring.current_score(repo_id).await;
        let records = self.scans.list(repo_id).await?;

        let window_start = Utc::now() - Duration::hours(self.window_hours);
        let drift_events_in_window = records
            .iter()
            .filter(|r| r.contributes_to_score() && r.created_at >= window_start)
            .map(|r| r.drift.drift_count())
            .sum();

        let exploits_prevented = self
            .attack_results
            .successful_count(repo_id)
            .await
            .map_err(|e| ScanError::Storage(e.to_string()))?;

        Ok(DashboardData {
            repo_id: repo_id.to_string(),
            score,
            severity_band: SeverityBand::from_score(score),
            drift_events_in_window,
            window_hours: self.window_hours,
            exploits_prevented,
            total_scans: records.len(),
            last_scan: records.into_iter().next(),
        })
    }
}

/// Red-team run against the findings of a repository's latest
/// contributing scan
pub struct RunRedTeamUseCase {
    scans: Arc<dyn ScanRepository>,
    graph_store: Arc<dyn GraphStore>,
    engine: Arc<AttackSimulationEngine>,
}

impl RunRedTeamUseCase {
    pub fn new(
        scans: Arc<dyn ScanRepository>,
        graph_store: Arc<dyn GraphStore>,
        engine: Arc<AttackSimulationEngine>,
    ) -> Self {
        Self {
            scans,
            graph_store,
            engine,
        }
    }

    /// Attack the findings of the newest passed or blocked scan. A
    /// repository with no such scan, or no findings, yields an empty
    /// report rather than an error.
    pub async fn execute(
        &self,
        repo_id: &str,
        scope: ModelScope,
    ) -> Result<RedTeamReport, ScanError> {
        let records = self.scans.list(repo_id).await?;
        let latest = records.into_iter().find(|r| r.contributes_to_score());

        let mut contexts = Vec::new();
        if let Some(record) = latest {
            let snapshot = self
                .graph_store
                .snapshot(repo_id, &record.revision_sha)
                .await
                .ok();
            for verdict in record.findings {
                let declared_guards = snapshot
                    .as_ref()
                    .and_then(|s| s.route(&verdict.endpoint_key))
                    .map(|route| route.guards.iter().cloned().collect())
                    .unwrap_or_default();
                contexts.push(FindingContext {
                    verdict,
                    declared_guards,
                });
            }
        }

        self.engine
            .run(repo_id, scope, &contexts)
            .await
            .map_err(|e| ScanError::Storage(e.to_string()))
    }
}
