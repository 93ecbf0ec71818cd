//! Types for the pipeline module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of running one batch through to its published output.
#[derive(Debug, Clone)]
pub struct MergedBatch {
    /// Batch name from the manifest.
    pub batch_name: String,
    /// Published output file.
    pub output_path: PathBuf,
    /// Clips that went into the output.
    pub clip_count: usize,
    /// Downloads that delivered fewer bytes than advertised.
    pub incomplete_downloads: usize,
}

/// Progress event for batch processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchEvent {
    /// Fetching the batch's sources.
    Downloading { batch: String, total_sources: usize },
    /// Bringing clips to the canonical codecs.
    Normalizing { batch: String, total_clips: usize },
    /// Joining and muxing the final output.
    Merging { batch: String, total_clips: usize },
    /// Output published.
    Completed {
        batch: String,
        output: PathBuf,
        clip_count: usize,
    },
    /// Batch gave up.
    Failed {
        batch: String,
        error: String,
        failed_stage: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_event_serialization() {
        let event = BatchEvent::Downloading {
            batch: "intro".to_string(),
            total_sources: 4,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"status\":\"downloading\""));
        assert!(json.contains("\"batch\":\"intro\""));

        let event = BatchEvent::Failed {
            batch: "intro".to_string(),
            error: "mux failed".to_string(),
            failed_stage: "merging".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("\"failed_stage\":\"merging\""));
    }
}
