//! Concrete inference backends

pub mod openai;
pub mod scripted;

pub use openai::OpenAiCompatAdapter;
pub use scripted::{ScriptedAdapter, ScriptedBehavior};
