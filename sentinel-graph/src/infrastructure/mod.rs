//! Graph store implementations

pub mod memory;
