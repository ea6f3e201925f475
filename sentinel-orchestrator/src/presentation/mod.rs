//! HTTP presentation layer

pub mod controllers;
pub mod models;
pub mod routes;
