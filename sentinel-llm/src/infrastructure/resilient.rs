//! Resilient adapter wrapper
//!
//! Adds a per-call timeout and a bounded retry to any [`InferenceAdapter`],
//! and absorbs terminal failures into abstentions so a slow or broken
//! backend degrades consensus instead of failing the scan.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use sentinel_core::config::InferenceConfig;
use sentinel_core::domain::ModelJudgment;

use crate::domain::{
    AdapterInfo, ExploitAssessment, ExploitProbe, InferenceAdapter, InferenceError,
    JudgmentRequest,
};

/// Wraps a backend with timeout, retry and abstention conversion
pub struct ResilientAdapter {
    inner: Arc<dyn InferenceAdapter>,
    request_timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
}

impl ResilientAdapter {
    pub fn new(inner: Arc<dyn InferenceAdapter>, config: &InferenceConfig) -> Self {
        Self {
            inner,
            request_timeout: config.request_timeout(),
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff(),
        }
    }

    pub fn info(&self) -> AdapterInfo {
        self.inner.info()
    }

    /// Judge one endpoint, converting any terminal failure into an
    /// abstention. Never errors; the caller always gets a judgment.
    pub async fn judge_endpoint(&self, request: &JudgmentRequest) -> ModelJudgment {
        let info = self.inner.info();
        let started = Instant::now();

        let outcome = self
            .with_retry(|| async {
                timeout(self.request_timeout, self.inner.judge(request))
                    .await
                    .map_err(|_| InferenceError::timeout(self.request_timeout.as_secs()))?
            })
            .await;

        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(payload) => ModelJudgment {
                model_id: info.id,
                vulnerability_type: payload.resolved_type(),
                confidence: payload.confidence.min(100),
                reasoning: payload.reasoning,
                latency_ms,
                error: None,
            },
            Err(e) => {
                warn!(
                    backend = %info.id,
                    endpoint = %request.endpoint_key,
                    error = %e,
                    "Backend failed, recording abstention"
                );
                ModelJudgment::abstention(info.id, e.to_string(), latency_ms)
            }
        }
    }

    /// Assess one exploit probe with the same timeout and retry budget.
    /// Failures propagate; the caller decides how to record them.
    pub async fn assess_exploit(
        &self,
        probe: &ExploitProbe,
    ) -> Result<ExploitAssessment, InferenceError> {
        self.with_retry(|| async {
            timeout(self.request_timeout, self.inner.assess_exploit(probe))
                .await
                .map_err(|_| InferenceError::timeout(self.request_timeout.as_secs()))?
        })
        .await
    }

    async fn with_retry<T, F, Fut>(&self, mut call: F) -> Result<T, InferenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, InferenceError>>,
    {
        let mut backoff = self.initial_backoff;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(
                    backend = %self.inner.info().id,
                    attempt = attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retrying backend call"
                );
                sleep(backoff).await;
                backoff = backoff * 2 + Duration::from_millis(jitter(backoff.as_millis() as u64 / 4));
            }

            match call().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !e.is_retryable() || attempt == self.max_retries {
                        return Err(e);
                    }
                    if let Some(retry_after) = e.retry_after() {
                        if retry_after <= self.request_timeout {
                            backoff = retry_after;
                        }
                    }
                }
            }
        }

        unreachable!("retry loop returns on final attempt")
    }
}

/// Randomness from the clock to spread retries apart
fn jitter(max: u64) -> u64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos as u64) % max.max(1)
}
