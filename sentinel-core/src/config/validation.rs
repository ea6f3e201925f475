//! Configuration validation module

use crate::config::{
    Config, ConsensusConfig, ExtractionConfig, InferenceConfig, ScanConfig, ScoringConfig,
    ServerConfig,
};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Server configuration error: {message}")]
    Server { message: String },

    #[error("Extraction configuration error: {message}")]
    Extraction { message: String },

    #[error("Inference configuration error: {message}")]
    Inference { message: String },

    #[error("Consensus configuration error: {message}")]
    Consensus { message: String },

    #[error("Scoring configuration error: {message}")]
    Scoring { message: String },

    #[error("Scan configuration error: {message}")]
    Scan { message: String },
}

impl ValidationError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    pub fn consensus(message: impl Into<String>) -> Self {
        Self::Consensus {
            message: message.into(),
        }
    }

    pub fn scoring(message: impl Into<String>) -> Self {
        Self::Scoring {
            message: message.into(),
        }
    }

    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan {
            message: message.into(),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::server("Port must be in range 1-65535"));
        }
        if self.host.is_empty() {
            return Err(ValidationError::server("Host cannot be empty"));
        }
        Ok(())
    }
}

impl Validate for ExtractionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.source_extensions.is_empty() {
            return Err(ValidationError::extraction(
                "At least one source extension must be configured",
            ));
        }
        Ok(())
    }
}

impl Validate for InferenceConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_seconds == 0 {
            return Err(ValidationError::inference(
                "Request timeout must be greater than zero",
            ));
        }
        if self.max_retries > 1 {
            return Err(ValidationError::inference(format!(
                "At most one retry per call is permitted, got {}",
                self.max_retries
            )));
        }
        for backend in &self.backends {
            if backend.id.is_empty() {
                return Err(ValidationError::inference("Backend id cannot be empty"));
            }
            match backend.kind.as_str() {
                "openai_compatible" => {
                    if backend.base_url.as_deref().unwrap_or("").is_empty() {
                        return Err(ValidationError::inference(format!(
                            "Backend '{}' requires a base_url",
                            backend.id
                        )));
                    }
                }
                "scripted" => {}
                other => {
                    return Err(ValidationError::inference(format!(
                        "Unknown backend kind '{}' for backend '{}'",
                        other, backend.id
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Validate for ConsensusConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.disagreement_penalty) || self.disagreement_penalty == 0.0 {
            return Err(ValidationError::consensus(
                "Disagreement penalty must be in (0, 1]",
            ));
        }
        if !(0.0..=100.0).contains(&self.block_threshold) {
            return Err(ValidationError::consensus(
                "Block threshold must be in [0, 100]",
            ));
        }
        if self.single_model_confidence_cap >= self.block_threshold {
            return Err(ValidationError::consensus(
                "Single-model confidence cap must stay below the block threshold",
            ));
        }
        Ok(())
    }
}

impl Validate for ScoringConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let weights = [
            self.bola_weight,
            self.idor_weight,
            self.privilege_escalation_weight,
            self.other_weight,
            self.drift_penalty,
        ];
        if weights.iter().any(|w| *w < 0.0 || *w > 100.0) {
            return Err(ValidationError::scoring(
                "Severity weights must be in [0, 100]",
            ));
        }
        Ok(())
    }
}

impl Validate for ScanConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrent_scans == 0 {
            return Err(ValidationError::scan(
                "Worker pool size must be at least 1",
            ));
        }
        if self.dashboard_window_hours <= 0 {
            return Err(ValidationError::scan(
                "Dashboard window must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.extraction.validate()?;
        self.inference.validate()?;
        self.consensus.validate()?;
        self.scoring.validate()?;
        self.scan.validate()?;
        Ok(())
    }
}
