//! Infrastructure - concrete backends and supporting plumbing

pub mod prompts;
pub mod providers;
pub mod resilient;
pub mod response_parser;
