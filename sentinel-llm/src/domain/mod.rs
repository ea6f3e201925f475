//! Inference domain types

pub mod adapter;
pub mod error;

pub use adapter::{
    AdapterInfo, ExploitAssessment, ExploitProbe, InferenceAdapter, JudgmentPayload,
    JudgmentRequest,
};
pub use error::InferenceError;
