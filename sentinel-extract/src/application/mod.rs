//! Extraction use cases

pub mod use_cases;
