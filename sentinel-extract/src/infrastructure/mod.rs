//! Extraction infrastructure

pub mod route_matcher;
