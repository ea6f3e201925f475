//! Infrastructure - scan storage and queueing

pub mod scan_queue;
pub mod scan_store;
