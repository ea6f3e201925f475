//! Sentinel LLM - inference adapters and consensus
//!
//! Defines the uniform capability for submitting an endpoint descriptor to
//! a named reasoning backend and receiving a structured vulnerability
//! judgment, plus the consensus engine that reconciles judgments from two
//! or more backends into a single verdict.
//!
//! Backend failures never escape this crate as errors: the resilient
//! wrapper converts timeouts and transport failures into abstentions, and
//! the consensus engine treats an abstention as "no vote", never as a
//! "no vulnerability" vote.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::consensus::ConsensusEngine;
pub use domain::adapter::{
    AdapterInfo, ExploitAssessment, ExploitProbe, InferenceAdapter, JudgmentPayload,
    JudgmentRequest,
};
pub use domain::error::InferenceError;
pub use infrastructure::providers::{OpenAiCompatAdapter, ScriptedAdapter};
pub use infrastructure::resilient::ResilientAdapter;
