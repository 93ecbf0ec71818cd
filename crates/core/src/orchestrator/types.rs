//! Types for the batch orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::engine::EngineError;

/// Errors that abort a whole run before any batch starts.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Working directories could not be prepared.
    #[error("failed to prepare working directories: {0}")]
    Layout(#[from] std::io::Error),

    /// The media engine is unusable.
    #[error("media engine unavailable: {0}")]
    Engine(#[from] EngineError),
}

/// Lifecycle of one batch.
///
/// A batch moves forward through the working states and ends in
/// either `Done` or `Failed`; a failed batch is never resumed within
/// the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Pending,
    Downloading,
    Normalizing,
    Merging,
    Done,
    Failed,
}

impl BatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Normalizing => "normalizing",
            Self::Merging => "merging",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// True once the batch can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one batch within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Batch name from the manifest.
    pub batch: String,
    /// Terminal state, `Done` or `Failed`.
    pub state: BatchState,
    /// Published output, present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Clips that went into the output.
    pub clip_count: usize,
    /// Downloads that delivered fewer bytes than advertised.
    pub incomplete_downloads: usize,
    /// Failure description, present only on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// State the batch was in when it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<BatchState>,
    /// Wall time spent on the batch.
    pub duration_ms: u64,
}

/// Outcome of a whole run, one report per batch in manifest order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub reports: Vec<BatchReport>,
}

impl RunSummary {
    /// Number of batches that reached `Done`.
    pub fn succeeded(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.state == BatchState::Done)
            .count()
    }

    /// Names of batches that ended `Failed`, in manifest order.
    pub fn failed_batches(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|r| r.state == BatchState::Failed)
            .map(|r| r.batch.as_str())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.reports.iter().all(|r| r.state == BatchState::Done)
    }
}
