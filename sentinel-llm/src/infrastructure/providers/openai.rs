//! OpenAI-compatible chat backend
//!
//! Works against OpenAI itself and any server speaking the same protocol
//! (vLLM, Ollama, llama.cpp server, hosted inference gateways).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::domain::{
    AdapterInfo, ExploitAssessment, ExploitProbe, InferenceAdapter, InferenceError,
    JudgmentPayload, JudgmentRequest,
};
use crate::infrastructure::prompts;
use crate::infrastructure::response_parser;

/// Adapter for an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiCompatAdapter {
    client: Client,
    id: String,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatAdapter {
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                InferenceError::Configuration(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            id: id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Send one chat completion and return the assistant message text
    async fn complete(&self, system: &str, user: String) -> Result<String, InferenceError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature: 0.0,
        };

        debug!(backend = %self.id, model = %self.model, "Sending chat completion request");

        let mut req = self.client.post(self.chat_url()).json(&request);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => InferenceError::Authentication(text),
                429 => InferenceError::RateLimited {
                    retry_after,
                    message: text,
                },
                400 | 404 | 422 => InferenceError::InvalidRequest(text),
                s if s >= 500 => InferenceError::ServiceUnavailable(text),
                _ => {
                    error!(backend = %self.id, status = %status, "Unexpected API error: {}", text);
                    InferenceError::InvalidResponse(format!("API error {}: {}", status, text))
                }
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                InferenceError::InvalidResponse("response contained no choices".to_string())
            })
    }
}

#[async_trait]
impl InferenceAdapter for OpenAiCompatAdapter {
    fn info(&self) -> AdapterInfo {
        AdapterInfo {
            id: self.id.clone(),
            model: self.model.clone(),
        }
    }

    async fn judge(&self, request: &JudgmentRequest) -> Result<JudgmentPayload, InferenceError> {
        let content = self
            .complete(
                prompts::DETECTION_SYSTEM_PROMPT,
                prompts::detection_prompt(request),
            )
            .await?;
        response_parser::parse_json(&content)
    }

    async fn assess_exploit(
        &self,
        probe: &ExploitProbe,
    ) -> Result<ExploitAssessment, InferenceError> {
        let content = self
            .complete(
                prompts::EXPLOIT_SYSTEM_PROMPT,
                prompts::exploit_prompt(probe),
            )
            .await?;
        response_parser::parse_json(&content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
