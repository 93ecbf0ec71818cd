//! Batch orchestrator implementation.
//!
//! Drives every batch of a run through the pipeline and collects one
//! report per batch. Batches are independent: a failure is recorded
//! and the run moves on.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::downloader::ClipFetcher;
use crate::engine::MediaEngine;
use crate::manifest::Batch;
use crate::pipeline::{BatchEvent, BatchPipeline};

use super::config::OrchestratorConfig;
use super::types::{BatchReport, BatchState, OrchestratorError, RunSummary};

/// The batch orchestrator - runs a manifest's batches to completion.
pub struct BatchOrchestrator<F, E>
where
    F: ClipFetcher + 'static,
    E: MediaEngine + 'static,
{
    config: OrchestratorConfig,
    pipeline: Arc<BatchPipeline<F, E>>,
}

impl<F, E> BatchOrchestrator<F, E>
where
    F: ClipFetcher + 'static,
    E: MediaEngine + 'static,
{
    /// Create a new orchestrator.
    pub fn new(config: OrchestratorConfig, pipeline: Arc<BatchPipeline<F, E>>) -> Self {
        Self { config, pipeline }
    }

    /// Runs every batch and returns one report per batch, in input
    /// order.
    ///
    /// Fails early only when the environment itself is unusable: the
    /// working directories cannot be created or the media engine is
    /// missing. Per-batch failures end up in the summary instead.
    pub async fn run(
        &self,
        batches: &[Batch],
        progress: Option<mpsc::Sender<BatchEvent>>,
    ) -> Result<RunSummary, OrchestratorError> {
        let started_at = Utc::now();

        let layout = self.pipeline.layout();
        layout.ensure().await?;
        layout.purge_scratch().await?;
        self.pipeline.engine().validate().await?;

        info!(batches = batches.len(), "starting run");

        let reports: Vec<BatchReport> = stream::iter(batches.iter().map(|batch| {
            let pipeline = Arc::clone(&self.pipeline);
            let progress = progress.clone();
            async move {
                let clock = Instant::now();
                let outcome = pipeline.run_batch(batch, progress).await;
                let duration_ms = clock.elapsed().as_millis() as u64;

                match outcome {
                    Ok(merged) => {
                        info!(
                            batch = %batch.name,
                            output = %merged.output_path.display(),
                            clips = merged.clip_count,
                            duration_ms = duration_ms,
                            "batch done"
                        );
                        BatchReport {
                            batch: batch.name.clone(),
                            state: BatchState::Done,
                            output: Some(merged.output_path),
                            clip_count: merged.clip_count,
                            incomplete_downloads: merged.incomplete_downloads,
                            error: None,
                            failed_stage: None,
                            duration_ms,
                        }
                    }
                    Err(e) => {
                        error!(
                            batch = %batch.name,
                            stage = %e.failed_stage(),
                            error = %e,
                            "batch failed"
                        );
                        BatchReport {
                            batch: batch.name.clone(),
                            state: BatchState::Failed,
                            output: None,
                            clip_count: 0,
                            incomplete_downloads: 0,
                            error: Some(e.to_string()),
                            failed_stage: Some(e.failed_stage()),
                            duration_ms,
                        }
                    }
                }
            }
        }))
        // buffered (not buffer_unordered) keeps reports in input order
        .buffered(self.config.max_concurrent_batches.max(1))
        .collect()
        .await;

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            reports,
        };
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed_batches().len(),
            "run finished"
        );
        Ok(summary)
    }
}
