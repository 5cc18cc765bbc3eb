//! Common utilities for the replicator workspace
//!
//! Provides shared environment-variable helpers and telemetry init.

pub mod env;
pub mod telemetry;

pub use telemetry::init_tracing;
