//! Infrastructure - attack result storage

pub mod memory;
