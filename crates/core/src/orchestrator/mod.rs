//! Batch orchestrator for whole-manifest runs.
//!
//! The orchestrator prepares the working directories, verifies the
//! media engine, then drives every batch through the pipeline:
//! - **Batches**: bounded concurrency, reports in input order
//! - **Isolation**: one batch failing never touches its siblings

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::BatchOrchestrator;
pub use types::{BatchReport, BatchState, OrchestratorError, RunSummary};
