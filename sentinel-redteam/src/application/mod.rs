//! Application services

pub mod simulator;
