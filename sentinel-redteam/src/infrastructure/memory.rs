//! In-memory attack result repository

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use sentinel_core::domain::AttackSimulationResult;

use crate::domain::{AttackResultRepository, RedTeamError};

type ResultKey = (Uuid, String, String);

/// Process-local attack result storage
#[derive(Default)]
pub struct InMemoryAttackResultRepository {
    results: RwLock<HashMap<ResultKey, AttackSimulationResult>>,
}

impl InMemoryAttackResultRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(result: &AttackSimulationResult) -> ResultKey {
        (
            result.finding_ref,
            result.attack_name.clone(),
            result.model_source.clone(),
        )
    }
}

#[async_trait]
impl AttackResultRepository for InMemoryAttackResultRepository {
    async fn upsert(&self, result: AttackSimulationResult) -> Result<(), RedTeamError> {
        let mut results = self.results.write().await;
        results.insert(Self::key(&result), result);
        Ok(())
    }

    async fn list_for_repo(
        &self,
        repo_id: &str,
    ) -> Result<Vec<AttackSimulationResult>, RedTeamError> {
        let results = self.results.read().await;
        let mut matching: Vec<AttackSimulationResult> = results
            .values()
            .filter(|r| r.repo_id == repo_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.simulated_at.cmp(&a.simulated_at));
        Ok(matching)
    }

    async fn list_for_finding(
        &self,
        finding_ref: Uuid,
    ) -> Result<Vec<AttackSimulationResult>, RedTeamError> {
        let results = self.results.read().await;
        let mut matching: Vec<AttackSimulationResult> = results
            .values()
            .filter(|r| r.finding_ref == finding_ref)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.attack_name.cmp(&b.attack_name));
        Ok(matching)
    }

    async fn successful_count(&self, repo_id: &str) -> Result<usize, RedTeamError> {
        let results = self.results.read().await;
        Ok(results
            .values()
            .filter(|r| r.repo_id == repo_id && r.attack_successful)
            .count())
    }

    async fn reset(&self, repo_id: &str) -> Result<(), RedTeamError> {
        let mut results = self.results.write().await;
        results.retain(|_, r| r.repo_id != repo_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sentinel_core::domain::{EndpointKey, ExploitationDifficulty};

    fn result(finding_ref: Uuid, attack_name: &str, model_source: &str, successful: bool) -> AttackSimulationResult {
        AttackSimulationResult {
            finding_ref,
            repo_id: "shop".into(),
            target: EndpointKey {
                repo_id: "shop".into(),
                method: "GET".into(),
                path_template: "/orders/{order_id}".into(),
            },
            attack_name: attack_name.into(),
            attack_description: String::new(),
            attack_successful: successful,
            exploitation_difficulty: ExploitationDifficulty::Moderate,
            model_source: model_source.into(),
            confidence: 75,
            reasoning: String::new(),
            simulated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_same_key_and_stacks_models() {
        let repo = InMemoryAttackResultRepository::new();
        let finding = Uuid::new_v4();

        repo.upsert(result(finding, "Role Bypass", "qwen", false))
            .await
            .unwrap();
        repo.upsert(result(finding, "Role Bypass", "qwen", true))
            .await
            .unwrap();
        repo.upsert(result(finding, "Role Bypass", "llama", true))
            .await
            .unwrap();

        let stored = repo.list_for_finding(finding).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(repo.successful_count("shop").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn reset_clears_only_the_named_repo() {
        let repo = InMemoryAttackResultRepository::new();
        let finding = Uuid::new_v4();
        repo.upsert(result(finding, "Role Bypass", "qwen", true))
            .await
            .unwrap();

        let mut other = result(Uuid::new_v4(), "Role Bypass", "qwen", true);
        other.repo_id = "blog".into();
        repo.upsert(other).await.unwrap();

        repo.reset("shop").await.unwrap();
        assert!(repo.list_for_repo("shop").await.unwrap().is_empty());
        assert_eq!(repo.list_for_repo("blog").await.unwrap().len(), 1);
    }
}
