//! Sentinel Extract - structural endpoint extraction
//!
//! Parses a source revision into a normalized, deterministic list of route
//! descriptors: HTTP method, path template, handler identity, declared
//! authorization guards, and handler parameters. Guard detection is driven
//! by a configurable set of known guard signatures; unrecognized guard
//! forms yield an empty guard set for the route instead of failing the
//! extraction.
//!
//! No language grammar is embedded: routes are recognized by structural
//! pattern matching over decorator-style route registrations
//! (`@router.get("/path")`) with dependency-injected guards
//! (`Depends(verify_token)`).

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::use_cases::ExtractEndpointsUseCase;
pub use domain::ExtractionError;
