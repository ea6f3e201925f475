//! Scripted backend for tests and offline dry runs
//!
//! Returns pre-seeded judgments keyed by endpoint identity instead of
//! calling a real model. Lets lifecycle tests pin exact consensus inputs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use sentinel_core::domain::ExploitationDifficulty;

use crate::domain::{
    AdapterInfo, ExploitAssessment, ExploitProbe, InferenceAdapter, InferenceError,
    JudgmentPayload, JudgmentRequest,
};

/// Failure mode of a scripted backend
#[derive(Debug)]
pub enum ScriptedBehavior {
    /// Answer every request from the script
    Respond,
    /// Fail every request as a timeout
    TimeoutAlways,
    /// Fail the first `n` requests as timeouts, then answer from the script
    TimeoutFirst(AtomicU32),
}

/// In-memory adapter answering from a fixed script.
///
/// Judgments are keyed by `"METHOD path_template"`; requests with no entry
/// get the default judgment (a clean vote).
pub struct ScriptedAdapter {
    id: String,
    behavior: ScriptedBehavior,
    judgments: HashMap<String, JudgmentPayload>,
    default_judgment: JudgmentPayload,
    assessments: HashMap<String, ExploitAssessment>,
    default_assessment: ExploitAssessment,
}

impl ScriptedAdapter {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            behavior: ScriptedBehavior::Respond,
            judgments: HashMap::new(),
            default_judgment: JudgmentPayload::clean(80),
            assessments: HashMap::new(),
            default_assessment: ExploitAssessment {
                attack_successful: false,
                exploitation_difficulty: ExploitationDifficulty::Hard,
                confidence: 50,
                reasoning: "scripted default".to_string(),
            },
        }
    }

    /// Seed the judgment returned for one endpoint
    pub fn with_judgment(
        mut self,
        method: &str,
        path_template: &str,
        payload: JudgmentPayload,
    ) -> Self {
        self.judgments
            .insert(Self::key(method, path_template), payload);
        self
    }

    /// Judgment returned when no script entry matches
    pub fn with_default_judgment(mut self, payload: JudgmentPayload) -> Self {
        self.default_judgment = payload;
        self
    }

    /// Seed the assessment returned for one attack name
    pub fn with_assessment(mut self, attack_name: &str, assessment: ExploitAssessment) -> Self {
        self.assessments.insert(attack_name.to_string(), assessment);
        self
    }

    pub fn with_default_assessment(mut self, assessment: ExploitAssessment) -> Self {
        self.default_assessment = assessment;
        self
    }

    /// Fail every request as a timeout
    pub fn timing_out(mut self) -> Self {
        self.behavior = ScriptedBehavior::TimeoutAlways;
        self
    }

    /// Fail the first `n` requests as timeouts, then follow the script
    pub fn timing_out_first(mut self, n: u32) -> Self {
        self.behavior = ScriptedBehavior::TimeoutFirst(AtomicU32::new(n));
        self
    }

    fn key(method: &str, path_template: &str) -> String {
        format!("{} {}", method, path_template)
    }

    fn check_behavior(&self) -> Result<(), InferenceError> {
        match &self.behavior {
            ScriptedBehavior::Respond => Ok(()),
            ScriptedBehavior::TimeoutAlways => Err(InferenceError::timeout(0)),
            ScriptedBehavior::TimeoutFirst(remaining) => {
                let prev = remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .unwrap_or(0);
                if prev > 0 {
                    Err(InferenceError::timeout(0))
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[async_trait]
impl InferenceAdapter for ScriptedAdapter {
    fn info(&self) -> AdapterInfo {
        AdapterInfo {
            id: self.id.clone(),
            model: format!("scripted/{}", self.id),
        }
    }

    async fn judge(&self, request: &JudgmentRequest) -> Result<JudgmentPayload, InferenceError> {
        self.check_behavior()?;
        let key = Self::key(
            &request.endpoint_key.method,
            &request.endpoint_key.path_template,
        );
        Ok(self
            .judgments
            .get(&key)
            .cloned()
            .unwrap_or_else(|| self.default_judgment.clone()))
    }

    async fn assess_exploit(
        &self,
        probe: &ExploitProbe,
    ) -> Result<ExploitAssessment, InferenceError> {
        self.check_behavior()?;
        Ok(self
            .assessments
            .get(&probe.attack_name)
            .cloned()
            .unwrap_or_else(|| self.default_assessment.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::domain::{Endpoint, VulnerabilityType};
    use std::collections::BTreeSet;

    fn endpoint(method: &str, path: &str) -> Endpoint {
        Endpoint {
            repo_id: "shop".into(),
            revision_sha: "abc123".into(),
            method: method.into(),
            path_template: path.into(),
            handler_name: "handler".into(),
            file_path: "app/main.py".into(),
            declared_guards: BTreeSet::new(),
            parameters: Vec::new(),
            handler_source: String::new(),
        }
    }

    #[tokio::test]
    async fn answers_from_script_with_clean_fallback() {
        let adapter = ScriptedAdapter::new("scripted-a").with_judgment(
            "GET",
            "/orders/{order_id}",
            JudgmentPayload::finding(VulnerabilityType::Bola, 90, "no ownership check"),
        );

        let flagged = adapter
            .judge(&JudgmentRequest::from_endpoint(&endpoint(
                "GET",
                "/orders/{order_id}",
            )))
            .await
            .unwrap();
        assert!(flagged.has_vulnerability);

        let fallback = adapter
            .judge(&JudgmentRequest::from_endpoint(&endpoint("GET", "/health")))
            .await
            .unwrap();
        assert!(!fallback.has_vulnerability);
        assert_eq!(fallback.confidence, 80);
    }

    #[tokio::test]
    async fn timeout_first_recovers_after_budget() {
        let adapter = ScriptedAdapter::new("flaky").timing_out_first(2);
        let request = JudgmentRequest::from_endpoint(&endpoint("GET", "/health"));

        assert!(adapter.judge(&request).await.is_err());
        assert!(adapter.judge(&request).await.is_err());
        assert!(adapter.judge(&request).await.is_ok());
    }
}
