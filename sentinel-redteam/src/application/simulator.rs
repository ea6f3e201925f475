//! Attack simulation engine
//!
//! For every targeted finding, plays the attack catalogue for its
//! vulnerability class against the backend that produced the finding and
//! records whether each attack would succeed. A backend failure records a
//! failed attack rather than aborting the run.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use sentinel_core::config::RedTeamConfig;
use sentinel_core::domain::{
    AttackSimulationResult, ExploitationDifficulty, ModelScope, RedTeamReport, RedTeamSummary,
    VulnerabilityType, VulnerabilityVerdict,
};
use sentinel_llm::{ExploitProbe, ResilientAdapter};

use crate::domain::{AttackResultRepository, RedTeamError, scenarios_for};

/// A finding plus the guard state of its target route at finding time
#[derive(Debug, Clone)]
pub struct FindingContext {
    pub verdict: VulnerabilityVerdict,
    pub declared_guards: Vec<String>,
}

/// Runs attack simulations against persisted findings
pub struct AttackSimulationEngine {
    adapters: Vec<Arc<ResilientAdapter>>,
    repository: Arc<dyn AttackResultRepository>,
    max_attacks_per_finding: usize,
}

impl AttackSimulationEngine {
    pub fn new(
        adapters: Vec<Arc<ResilientAdapter>>,
        repository: Arc<dyn AttackResultRepository>,
        config: &RedTeamConfig,
    ) -> Self {
        Self {
            adapters,
            repository,
            max_attacks_per_finding: config.max_attacks_per_finding,
        }
    }

    /// Simulate attacks against the given findings under the given scope.
    ///
    /// `single_model` attacks only findings the named model voted on;
    /// `combined` attacks every finding once per voting model, stacking
    /// results without cross-model deduplication.
    pub async fn run(
        &self,
        repo_id: &str,
        scope: ModelScope,
        findings: &[FindingContext],
    ) -> Result<RedTeamReport, RedTeamError> {
        let mut summary = RedTeamSummary::default();
        let mut results = Vec::new();

        for context in findings {
            let sources = self.source_models(&scope, &context.verdict);
            if sources.is_empty() {
                continue;
            }
            summary.findings_analyzed += 1;

            let scenarios = scenarios_for(context.verdict.vulnerability_type);
            let scenarios = &scenarios[..scenarios.len().min(self.max_attacks_per_finding)];

            for model_id in sources {
                for scenario in scenarios {
                    let probe = ExploitProbe {
                        attack_name: scenario.name.to_string(),
                        attack_description: scenario.description.to_string(),
                        endpoint_key: context.verdict.endpoint_key.clone(),
                        declared_guards: context.declared_guards.clone(),
                        vulnerability_type: context.verdict.vulnerability_type,
                        finding_reasoning: context.verdict.reasoning.clone(),
                    };

                    let result = self
                        .simulate_one(repo_id, &context.verdict, &model_id, probe)
                        .await;

                    summary.attacks_simulated += 1;
                    if result.attack_successful {
                        summary.successful_attacks += 1;
                        if matches!(
                            context.verdict.vulnerability_type,
                            VulnerabilityType::Bola | VulnerabilityType::PrivilegeEscalation
                        ) {
                            summary.high_risk += 1;
                        }
                    }

                    self.repository.upsert(result.clone()).await?;
                    results.push(result);
                }
            }
        }

        info!(
            repo_id = %repo_id,
            findings = summary.findings_analyzed,
            attacks = summary.attacks_simulated,
            successful = summary.successful_attacks,
            "Red-team run complete"
        );

        Ok(RedTeamReport {
            repo_id: repo_id.to_string(),
            model_scope: scope,
            summary,
            results,
            generated_at: Utc::now(),
        })
    }

    /// Models whose findings this run attacks, restricted to models that
    /// actually voted on the verdict
    fn source_models(&self, scope: &ModelScope, verdict: &VulnerabilityVerdict) -> Vec<String> {
        let voters = verdict.voting_models();
        match scope {
            ModelScope::SingleModel { model_id } => {
                if voters.iter().any(|v| v == model_id) {
                    vec![model_id.clone()]
                } else {
                    Vec::new()
                }
            }
            ModelScope::Combined => voters.into_iter().map(String::from).collect(),
        }
    }

    async fn simulate_one(
        &self,
        repo_id: &str,
        verdict: &VulnerabilityVerdict,
        model_id: &str,
        probe: ExploitProbe,
    ) -> AttackSimulationResult {
        let assessment = match self.adapter_for(model_id) {
            Some(adapter) => adapter.assess_exploit(&probe).await,
            None => {
                warn!(model_id = %model_id, "No configured backend for model, recording failed attack");
                Err(sentinel_llm::InferenceError::Configuration(format!(
                    "no configured backend with id '{}'",
                    model_id
                )))
            }
        };

        match assessment {
            Ok(a) => AttackSimulationResult {
                finding_ref: verdict.id,
                repo_id: repo_id.to_string(),
                target: probe.endpoint_key,
                attack_name: probe.attack_name,
                attack_description: probe.attack_description,
                attack_successful: a.attack_successful,
                exploitation_difficulty: a.exploitation_difficulty,
                model_source: model_id.to_string(),
                confidence: a.confidence.min(100),
                reasoning: a.reasoning,
                simulated_at: Utc::now(),
            },
            Err(e) => AttackSimulationResult {
                finding_ref: verdict.id,
                repo_id: repo_id.to_string(),
                target: probe.endpoint_key,
                attack_name: probe.attack_name,
                attack_description: probe.attack_description,
                attack_successful: false,
                exploitation_difficulty: ExploitationDifficulty::Hard,
                model_source: model_id.to_string(),
                confidence: 0,
                reasoning: format!("assessment unavailable: {}", e),
                simulated_at: Utc::now(),
            },
        }
    }

    fn adapter_for(&self, model_id: &str) -> Option<&ResilientAdapter> {
        self.adapters
            .iter()
            .map(|a| a.as_ref())
            .find(|a| a.info().id == model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryAttackResultRepository;
    use sentinel_core::config::InferenceConfig;
    use sentinel_core::domain::{EndpointKey, ModelJudgment, ValidatedBy};
    use sentinel_llm::{ExploitAssessment, ScriptedAdapter};
    use uuid::Uuid;

    fn adapter(id: &str, successful: bool) -> Arc<ResilientAdapter> {
        let scripted = ScriptedAdapter::new(id).with_default_assessment(ExploitAssessment {
            attack_successful: successful,
            exploitation_difficulty: ExploitationDifficulty::Moderate,
            confidence: 80,
            reasoning: "scripted".into(),
        });
        Arc::new(ResilientAdapter::new(
            Arc::new(scripted),
            &InferenceConfig::default(),
        ))
    }

    fn vote(model_id: &str) -> ModelJudgment {
        ModelJudgment {
            model_id: model_id.into(),
            vulnerability_type: Some(VulnerabilityType::Bola),
            confidence: 90,
            reasoning: String::new(),
            latency_ms: 10,
            error: None,
        }
    }

    fn finding(voters: &[&str]) -> FindingContext {
        FindingContext {
            verdict: VulnerabilityVerdict {
                id: Uuid::new_v4(),
                endpoint_key: EndpointKey {
                    repo_id: "shop".into(),
                    method: "GET".into(),
                    path_template: "/orders/{order_id}".into(),
                },
                vulnerability_type: VulnerabilityType::Bola,
                confidence: 87.5,
                reasoning: "no ownership check".into(),
                contributing_models: voters.iter().map(|v| vote(v)).collect(),
                validated_by: ValidatedBy::Consensus,
            },
            declared_guards: vec!["verify_token".into()],
        }
    }

    #[tokio::test]
    async fn combined_scope_stacks_results_per_voting_model() {
        let repo = Arc::new(InMemoryAttackResultRepository::new());
        let engine = AttackSimulationEngine::new(
            vec![adapter("qwen", true), adapter("llama", false)],
            repo.clone(),
            &RedTeamConfig::default(),
        );

        let report = engine
            .run("shop", ModelScope::Combined, &[finding(&["qwen", "llama"])])
            .await
            .unwrap();

        // two models x three BOLA scenarios
        assert_eq!(report.summary.findings_analyzed, 1);
        assert_eq!(report.summary.attacks_simulated, 6);
        assert_eq!(report.summary.successful_attacks, 3);
        assert_eq!(report.summary.high_risk, 3);
        assert_eq!(repo.list_for_repo("shop").await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn single_model_scope_skips_other_models_findings() {
        let repo = Arc::new(InMemoryAttackResultRepository::new());
        let engine = AttackSimulationEngine::new(
            vec![adapter("qwen", true)],
            repo.clone(),
            &RedTeamConfig::default(),
        );

        let report = engine
            .run(
                "shop",
                ModelScope::SingleModel {
                    model_id: "qwen".into(),
                },
                &[finding(&["qwen"]), finding(&["llama"])],
            )
            .await
            .unwrap();

        assert_eq!(report.summary.findings_analyzed, 1);
        assert_eq!(report.summary.attacks_simulated, 3);
    }

    #[tokio::test]
    async fn missing_backend_records_failed_attacks() {
        let repo = Arc::new(InMemoryAttackResultRepository::new());
        let engine =
            AttackSimulationEngine::new(Vec::new(), repo.clone(), &RedTeamConfig::default());

        let report = engine
            .run("shop", ModelScope::Combined, &[finding(&["qwen"])])
            .await
            .unwrap();

        assert_eq!(report.summary.attacks_simulated, 3);
        assert_eq!(report.summary.successful_attacks, 0);
        assert!(
            report
                .results
                .iter()
                .all(|r| !r.attack_successful && r.confidence == 0)
        );
    }

    #[tokio::test]
    async fn attack_budget_truncates_the_catalogue() {
        let repo = Arc::new(InMemoryAttackResultRepository::new());
        let config = RedTeamConfig {
            max_attacks_per_finding: 1,
        };
        let engine = AttackSimulationEngine::new(vec![adapter("qwen", true)], repo, &config);

        let report = engine
            .run("shop", ModelScope::Combined, &[finding(&["qwen"])])
            .await
            .unwrap();

        assert_eq!(report.summary.attacks_simulated, 1);
    }

    #[tokio::test]
    async fn reruns_overwrite_rather_than_duplicate() {
        let repo = Arc::new(InMemoryAttackResultRepository::new());
        let engine = AttackSimulationEngine::new(
            vec![adapter("qwen", true)],
            repo.clone(),
            &RedTeamConfig::default(),
        );
        let target = finding(&["qwen"]);

        engine
            .run("shop", ModelScope::Combined, std::slice::from_ref(&target))
            .await
            .unwrap();
        engine
            .run("shop", ModelScope::Combined, std::slice::from_ref(&target))
            .await
            .unwrap();

        assert_eq!(repo.list_for_repo("shop").await.unwrap().len(), 3);
    }
}
