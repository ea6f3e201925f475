//! Auth integrity scoring
//!
//! The score is never stored as a mutable counter. Every contributing scan
//! appends one signed event, and the current score is reproduced by
//! replaying the event stream from the baseline, clamping to [0, 100]
//! after each event. Replaying the same stream always yields the same
//! score.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use sentinel_core::config::ScoringConfig;
use sentinel_core::domain::{
    BASELINE_SCORE, GraphDelta, ScoreEvent, VulnerabilityType, VulnerabilityVerdict,
};

/// Append-only score event storage
#[async_trait]
pub trait ScoreLedger: Send + Sync {
    async fn append(&self, event: ScoreEvent);

    /// Events for one repository in recorded order
    async fn events_for(&self, repo_id: &str) -> Vec<ScoreEvent>;

    /// Drop all events for a repository
    async fn reset(&self, repo_id: &str);
}

/// Process-local score ledger
#[derive(Default)]
pub struct InMemoryScoreLedger {
    events: RwLock<HashMap<String, Vec<ScoreEvent>>>,
}

impl InMemoryScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreLedger for InMemoryScoreLedger {
    async fn append(&self, event: ScoreEvent) {
        let mut events = self.events.write().await;
        events.entry(event.repo_id.clone()).or_default().push(event);
    }

    async fn events_for(&self, repo_id: &str) -> Vec<ScoreEvent> {
        let events = self.events.read().await;
        events.get(repo_id).cloned().unwrap_or_default()
    }

    async fn reset(&self, repo_id: &str) {
        let mut events = self.events.write().await;
        events.remove(repo_id);
    }
}

/// Computes scan deltas and replays the event stream into a score
pub struct ScoringEngine {
    config: ScoringConfig,
    ledger: Arc<dyn ScoreLedger>,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig, ledger: Arc<dyn ScoreLedger>) -> Self {
        Self { config, ledger }
    }

    /// Signed delta for one scan: penalties for blocking findings and for
    /// guard-removal drift, recovery credit for routes that regained a
    /// guard. Findings below the block threshold carry no penalty.
    pub fn scan_delta(
        &self,
        findings: &[VulnerabilityVerdict],
        drift: &GraphDelta,
        block_threshold: f64,
    ) -> f64 {
        let finding_penalty: f64 = findings
            .iter()
            .filter(|f| f.blocks_at(block_threshold))
            .map(|f| self.weight_for(f.vulnerability_type))
            .sum();

        let drift_penalty = self.config.drift_penalty * drift.drift_count() as f64;
        let recovery =
            self.config.drift_penalty * drift.routes_with_added_guards.len() as f64;

        recovery - finding_penalty - drift_penalty
    }

    fn weight_for(&self, vulnerability_type: VulnerabilityType) -> f64 {
        match vulnerability_type {
            VulnerabilityType::Bola => self.config.bola_weight,
            VulnerabilityType::Idor => self.config.idor_weight,
            VulnerabilityType::PrivilegeEscalation => self.config.privilege_escalation_weight,
            VulnerabilityType::Other => self.config.other_weight,
        }
    }

    /// Append one event to the ledger
    pub async fn record(&self, scan_id: Uuid, repo_id: &str, delta: f64) {
        debug!(repo_id = %repo_id, scan_id = %scan_id, delta = delta, "Recording score event");
        self.ledger
            .append(ScoreEvent {
                scan_id,
                repo_id: repo_id.to_string(),
                delta,
                recorded_at: Utc::now(),
            })
            .await;
    }

    /// Current score for a repository, replayed from the baseline
    pub async fn current_score(&self, repo_id: &str) -> f64 {
        let events = self.ledger.events_for(repo_id).await;
        events.iter().fold(BASELINE_SCORE, |score, event| {
            (score + event.delta).clamp(0.0, 100.0)
        })
    }

    pub async fn reset(&self, repo_id: &str) {
        self.ledger.reset(repo_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::domain::{EndpointKey, ValidatedBy};

    fn engine() -> ScoringEngine {
        ScoringEngine::new(
            ScoringConfig::default(),
            Arc::new(InMemoryScoreLedger::new()),
        )
    }

    fn key(path: &str) -> EndpointKey {
        EndpointKey {
            repo_id: "shop".into(),
            method: "GET".into(),
            path_template: path.into(),
        }
    }

    fn finding(vulnerability_type: VulnerabilityType, confidence: f64) -> VulnerabilityVerdict {
        VulnerabilityVerdict {
            id: Uuid::new_v4(),
            endpoint_key: key("/orders/{order_id}"),
            vulnerability_type,
            confidence,
            reasoning: String::new(),
            contributing_models: Vec::new(),
            validated_by: ValidatedBy::Consensus,
        }
    }

    #[test]
    fn blocking_findings_and_drift_are_penalized() {
        let drift = GraphDelta {
            routes_with_removed_guards: vec![key("/admin/users")],
            ..GraphDelta::default()
        };
        let delta = engine().scan_delta(
            &[
                finding(VulnerabilityType::Bola, 87.5),
                finding(VulnerabilityType::PrivilegeEscalation, 50.0),
            ],
            &drift,
            70.0,
        );

        // one blocking BOLA (-20) plus one drifted route (-4); the
        // sub-threshold finding costs nothing
        assert_eq!(delta, -24.0);
    }

    #[test]
    fn readded_guards_recover_score() {
        let drift = GraphDelta {
            routes_with_added_guards: vec![key("/admin/users")],
            ..GraphDelta::default()
        };
        let delta = engine().scan_delta(&[], &drift, 70.0);
        assert_eq!(delta, 4.0);
    }

    #[tokio::test]
    async fn replay_is_reproducible_and_clamped() {
        let ledger = Arc::new(InMemoryScoreLedger::new());
        let engine = ScoringEngine::new(ScoringConfig::default(), ledger);

        for delta in [-60.0, -60.0, 15.0] {
            engine.record(Uuid::new_v4(), "shop", delta).await;
        }

        // 100 -> 40 -> clamp(−20)=0 -> 15
        assert_eq!(engine.current_score("shop").await, 15.0);
        // replaying again yields the same value
        assert_eq!(engine.current_score("shop").await, 15.0);
    }

    #[tokio::test]
    async fn repos_are_isolated() {
        let ledger = Arc::new(InMemoryScoreLedger::new());
        let engine = ScoringEngine::new(ScoringConfig::default(), ledger);

        engine.record(Uuid::new_v4(), "shop", -20.0).await;
        assert_eq!(engine.current_score("shop").await, 80.0);
        assert_eq!(engine.current_score("blog").await, 100.0);

        engine.reset("shop").await;
        assert_eq!(engine.current_score("shop").await, 100.0);
    }
}
