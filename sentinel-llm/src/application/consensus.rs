//! Multi-model consensus
//!
//! Fans an endpoint out to every configured backend concurrently and
//! reconciles the judgments into one verdict. Reconciliation is a pure
//! function of the judgment set: judgments are sorted by model id first,
//! so the verdict never depends on arrival order.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};
use uuid::Uuid;

use sentinel_core::config::ConsensusConfig;
use sentinel_core::domain::{
    Endpoint, EndpointKey, EndpointVerdict, ModelJudgment, ValidatedBy, VulnerabilityType,
    VulnerabilityVerdict,
};

use crate::domain::JudgmentRequest;
use crate::infrastructure::resilient::ResilientAdapter;

/// Reconciles judgments from one or more backends into endpoint verdicts
pub struct ConsensusEngine {
    adapters: Vec<Arc<ResilientAdapter>>,
    config: ConsensusConfig,
}

impl ConsensusEngine {
    pub fn new(adapters: Vec<Arc<ResilientAdapter>>, config: ConsensusConfig) -> Self {
        Self { adapters, config }
    }

    pub fn backend_count(&self) -> usize {
        self.adapters.len()
    }

    /// Confidence at or above which a finding blocks its scan
    pub fn block_threshold(&self) -> f64 {
        self.config.block_threshold
    }

    /// Judge one endpoint across every backend and reconcile.
    ///
    /// Backend failures surface as abstentions inside the verdict's
    /// contributing judgments; this method itself cannot fail.
    pub async fn evaluate(
        &self,
        endpoint: &Endpoint,
        drift_note: Option<String>,
    ) -> EndpointVerdict {
        let mut request = JudgmentRequest::from_endpoint(endpoint);
        if let Some(note) = drift_note {
            request = request.with_drift_note(note);
        }

        debug!(
            endpoint = %request.endpoint_key,
            backends = self.adapters.len(),
            "Evaluating endpoint"
        );

        let judgments = join_all(
            self.adapters
                .iter()
                .map(|adapter| adapter.judge_endpoint(&request)),
        )
        .await;

        let verdict = self.reconcile(endpoint.key(), judgments);
        if let EndpointVerdict::Finding(finding) = &verdict {
            info!(
                endpoint = %finding.endpoint_key,
                vulnerability = %finding.vulnerability_type,
                confidence = finding.confidence,
                validated_by = %finding.validated_by,
                "Vulnerability finding"
            );
        }
        verdict
    }

    /// Reconcile a judgment set into a verdict. Pure and order-insensitive.
    pub fn reconcile(
        &self,
        endpoint_key: EndpointKey,
        mut judgments: Vec<ModelJudgment>,
    ) -> EndpointVerdict {
        judgments.sort_by(|a, b| a.model_id.cmp(&b.model_id));

        let voters: Vec<&ModelJudgment> =
            judgments.iter().filter(|j| !j.is_abstention()).collect();

        if voters.is_empty() {
            return EndpointVerdict::Indeterminate {
                endpoint_key,
                contributing_models: judgments,
            };
        }

        let flaggers: Vec<&ModelJudgment> = voters
            .iter()
            .copied()
            .filter(|j| j.flags_vulnerability())
            .collect();

        if flaggers.is_empty() {
            let confidence = voters.iter().map(|j| j.confidence as f64).sum::<f64>()
                / voters.len() as f64;
            return EndpointVerdict::Clean {
                endpoint_key,
                confidence,
                contributing_models: judgments,
            };
        }

        // A lone claim never reaches the block threshold on its own.
        if flaggers.len() == 1 {
            let flagger = flaggers[0];
            let confidence =
                (flagger.confidence as f64).min(self.config.single_model_confidence_cap);
            let verdict = VulnerabilityVerdict {
                id: Uuid::new_v4(),
                endpoint_key,
                vulnerability_type: flagger.vulnerability_type.unwrap_or(VulnerabilityType::Other),
                confidence,
                reasoning: flagger.reasoning.clone(),
                contributing_models: judgments.clone(),
                validated_by: ValidatedBy::SingleModelUnconfirmed,
            };
            return EndpointVerdict::Finding(verdict);
        }

        let unanimous = voters.len() == flaggers.len()
            && flaggers
                .iter()
                .all(|j| j.vulnerability_type == flaggers[0].vulnerability_type);

        if unanimous {
            let confidence = flaggers.iter().map(|j| j.confidence as f64).sum::<f64>()
                / flaggers.len() as f64;
            let strongest = strongest_flagger(&flaggers);
            let verdict = VulnerabilityVerdict {
                id: Uuid::new_v4(),
                endpoint_key,
                vulnerability_type: strongest.vulnerability_type.unwrap_or(VulnerabilityType::Other),
                confidence,
                reasoning: strongest.reasoning.clone(),
                contributing_models: judgments.clone(),
                validated_by: ValidatedBy::Consensus,
            };
            return EndpointVerdict::Finding(verdict);
        }

        // Disputed: adopt the highest-confidence flagged type at a penalty
        let strongest = strongest_flagger(&flaggers);
        let confidence = (strongest.confidence as f64) * self.config.disagreement_penalty;
        let verdict = VulnerabilityVerdict {
            id: Uuid::new_v4(),
            endpoint_key,
            vulnerability_type: strongest.vulnerability_type.unwrap_or(VulnerabilityType::Other),
            confidence,
            reasoning: strongest.reasoning.clone(),
            contributing_models: judgments.clone(),
            validated_by: ValidatedBy::MajorityDisputed,
        };
        EndpointVerdict::Finding(verdict)
    }
}

/// Highest-confidence flagger; ties resolve to the lowest model id because
/// the caller pre-sorts by model id
fn strongest_flagger<'a>(flaggers: &[&'a ModelJudgment]) -> &'a ModelJudgment {
    let mut best = flaggers[0];
    for j in &flaggers[1..] {
        if j.confidence > best.confidence {
            best = j;
        }
    }
    best
}
