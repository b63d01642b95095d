//! Integration test utilities for the presence coordination core
//!
//! This crate provides a harness that runs a real coordinator on its own
//! task and drives it through simulated client connections, plus fixtures
//! for common identity setups.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
