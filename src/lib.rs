//! Sentinel - authorization drift detection and multi-model consensus
//!
//! Library surface for the HTTP server binary: configuration, tracing
//! setup, and application wiring.

pub mod app;

pub use app::{AppHandle, create_app};
pub use sentinel_core::{Config, init_tracing};
