//! MATCHDAY: football match prediction and betting value analysis
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod config;
pub mod engine;
pub mod markets;
pub mod ml;
pub mod model;
pub mod types;
pub mod value;
