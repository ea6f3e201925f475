//! Sentinel Core - shared foundation for the authorization drift engine
//!
//! This crate provides:
//! - Domain model shared across analysis crates (endpoints, verdicts,
//!   scan records, attack results, score events)
//! - Configuration management with validation
//! - Structured logging bootstrap
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use sentinel_core::{Config, init_tracing};
//!
//! let config = Config::load()?;
//! init_tracing(&config.logging)?;
//! ```

pub mod config;
pub mod domain;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
