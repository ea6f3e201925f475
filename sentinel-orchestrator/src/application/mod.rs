//! Application services

pub mod scoring;
pub mod use_cases;
