//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub extraction: ExtractionConfig,
    pub inference: InferenceConfig,
    pub consensus: ConsensusConfig,
    pub scoring: ScoringConfig,
    pub scan: ScanConfig,
    pub redteam: RedTeamConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8084,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "sentinel=debug,info")
    pub level: String,
    /// Output format: "pretty", "compact" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Endpoint extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Guard signatures recognized as authorization-relevant dependencies.
    /// A route dependency matching none of these is reported as unguarded
    /// rather than failing extraction.
    pub known_guards: Vec<String>,
    /// Handler parameter names that denote the calling principal rather
    /// than an addressable resource.
    pub principal_params: Vec<String>,
    /// File extensions considered source files
    pub source_extensions: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            known_guards: vec![
                "verify_token".to_string(),
                "get_current_user".to_string(),
                "require_admin".to_string(),
                "require_role".to_string(),
                "check_permissions".to_string(),
                "oauth2_scheme".to_string(),
            ],
            principal_params: vec![
                "current_user".to_string(),
                "user".to_string(),
                "token".to_string(),
                "credentials".to_string(),
            ],
            source_extensions: vec!["py".to_string()],
        }
    }
}

/// A single configured inference backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Stable identifier used in judgments and reports (e.g. "qwen")
    pub id: String,
    /// Backend kind: "openai_compatible" or "scripted"
    pub kind: String,
    /// Base URL for HTTP backends
    pub base_url: Option<String>,
    /// API key for HTTP backends
    pub api_key: Option<String>,
    /// Model name submitted with each request
    pub model: Option<String>,
}

/// Inference adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Configured reasoning backends. Consensus requires at least one;
    /// two or more enable cross-model validation.
    pub backends: Vec<BackendConfig>,
    /// Per-call timeout in seconds
    pub request_timeout_seconds: u64,
    /// Retries per call after the first failure. At most one is permitted
    /// so a slow backend cannot stall a scan.
    pub max_retries: u32,
    /// Initial backoff before a retry, in milliseconds (jitter is added)
    pub initial_backoff_ms: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backends: Vec::new(),
            request_timeout_seconds: 30,
            max_retries: 1,
            initial_backoff_ms: 500,
        }
    }
}

impl InferenceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

/// Consensus reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Multiplier applied to the winning confidence when models disagree
    /// on vulnerability type
    pub disagreement_penalty: f64,
    /// Upper bound on the confidence of a finding confirmed by a single
    /// model. Must stay below `block_threshold` so a lone unconfirmed
    /// claim cannot block a scan.
    pub single_model_confidence_cap: f64,
    /// Verdict confidence at or above which a scan is blocked
    pub block_threshold: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            disagreement_penalty: 0.8,
            single_model_confidence_cap: 69.0,
            block_threshold: 70.0,
        }
    }
}

/// Auth integrity scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Penalty for a blocking BOLA verdict
    pub bola_weight: f64,
    /// Penalty for a blocking IDOR verdict
    pub idor_weight: f64,
    /// Penalty for a blocking privilege escalation verdict
    pub privilege_escalation_weight: f64,
    /// Penalty for other blocking verdicts
    pub other_weight: f64,
    /// Penalty per route whose guard set shrank, applied even without a
    /// confirmed verdict
    pub drift_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            bola_weight: 20.0,
            idor_weight: 15.0,
            privilege_escalation_weight: 15.0,
            other_weight: 5.0,
            drift_penalty: 4.0,
        }
    }
}

/// Scan orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Worker pool size. Scans for distinct repositories run in parallel;
    /// scans for the same repository are always serialized.
    pub max_concurrent_scans: usize,
    /// Additional consensus attempts for endpoints on which every model
    /// abstained before accepting an indeterminate verdict
    pub indeterminate_retries: u32,
    /// Window, in hours, over which the dashboard aggregates drift counts
    pub dashboard_window_hours: i64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrent_scans: 4,
            indeterminate_retries: 1,
            dashboard_window_hours: 24,
        }
    }
}

/// Attack simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedTeamConfig {
    /// Maximum attack scenarios synthesized per finding
    pub max_attacks_per_finding: usize,
}

impl Default for RedTeamConfig {
    fn default() -> Self {
        Self {
            max_attacks_per_finding: 3,
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Sources, lowest to highest priority:
    /// 1. `config/default` (optional file)
    /// 2. `config/{ENV}` when the `ENV` variable is set (optional file)
    /// 3. `config/local` (optional file)
    /// 4. `SENTINEL__`-prefixed environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("SENTINEL").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}
