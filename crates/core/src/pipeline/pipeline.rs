//! Batch pipeline implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, RwLock, Semaphore};
use tracing::{debug, info, warn};

use crate::downloader::{ClipFetcher, Dispatcher, DownloadError, DownloadResult};
use crate::engine::{ClipStreams, EngineError, MediaEngine, MergeJob};
use crate::manifest::Batch;
use crate::orchestrator::BatchState;
use crate::storage::StorageLayout;

use super::publish::publish_file;
use super::types::{BatchEvent, MergedBatch};

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A clip failed to download or resolve.
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    /// A clip failed to probe, transcode or split.
    #[error("normalize failed: {0}")]
    Normalize(#[source] EngineError),

    /// Joining or muxing the batch output failed.
    #[error("merge failed: {0}")]
    Merge(#[source] EngineError),

    /// Scratch directory could not be prepared.
    #[error("failed to prepare scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    /// The finished output could not be promoted.
    #[error("failed to publish output to {path}: {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// The stage the batch was in when this error occurred.
    pub fn failed_stage(&self) -> BatchState {
        match self {
            Self::Download(_) => BatchState::Downloading,
            Self::Normalize(_) => BatchState::Normalizing,
            Self::Merge(_) | Self::Scratch(_) | Self::Publish { .. } => BatchState::Merging,
        }
    }
}

/// The batch pipeline: download, normalize, merge, publish.
///
/// One instance serves the whole run; the transcode pool is shared
/// across batches so concurrent batches cannot oversubscribe the
/// encoder.
pub struct BatchPipeline<F: ClipFetcher, E: MediaEngine> {
    dispatcher: Dispatcher<F>,
    engine: Arc<E>,
    layout: StorageLayout,
    transcode_semaphore: Arc<Semaphore>,
    active: Arc<RwLock<HashMap<String, BatchState>>>,
}

impl<F: ClipFetcher + 'static, E: MediaEngine + 'static> BatchPipeline<F, E> {
    /// Creates a new pipeline.
    pub fn new(
        dispatcher: Dispatcher<F>,
        engine: Arc<E>,
        layout: StorageLayout,
        max_parallel_transcodes: usize,
    ) -> Self {
        Self {
            dispatcher,
            engine,
            layout,
            transcode_semaphore: Arc::new(Semaphore::new(max_parallel_transcodes.max(1))),
            active: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Snapshot of batches currently inside the pipeline.
    pub async fn active_states(&self) -> HashMap<String, BatchState> {
        self.active.read().await.clone()
    }

    /// Runs one batch to its terminal state.
    ///
    /// The batch's scratch directory is removed on both success and
    /// failure; published outputs and normalized streams stay.
    pub async fn run_batch(
        &self,
        batch: &Batch,
        progress: Option<mpsc::Sender<BatchEvent>>,
    ) -> Result<MergedBatch, PipelineError> {
        {
            let mut active = self.active.write().await;
            active.insert(batch.name.clone(), BatchState::Pending);
        }

        let result = self.execute(batch, progress.as_ref()).await;

        {
            let mut active = self.active.write().await;
            active.remove(&batch.name);
        }

        let scratch = self.layout.batch_scratch(&batch.name);
        if scratch.exists() {
            let _ = tokio::fs::remove_dir_all(&scratch).await;
        }

        if let Some(ref tx) = progress {
            let event = match &result {
                Ok(merged) => BatchEvent::Completed {
                    batch: batch.name.clone(),
                    output: merged.output_path.clone(),
                    clip_count: merged.clip_count,
                },
                Err(e) => BatchEvent::Failed {
                    batch: batch.name.clone(),
                    error: e.to_string(),
                    failed_stage: e.failed_stage().to_string(),
                },
            };
            let _ = tx.send(event).await;
        }

        result
    }

    async fn execute(
        &self,
        batch: &Batch,
        progress: Option<&mpsc::Sender<BatchEvent>>,
    ) -> Result<MergedBatch, PipelineError> {
        // Phase 1: download
        self.set_state(&batch.name, BatchState::Downloading).await;
        if let Some(tx) = progress {
            let _ = tx
                .send(BatchEvent::Downloading {
                    batch: batch.name.clone(),
                    total_sources: batch.sources.len(),
                })
                .await;
        }
        info!(batch = %batch.name, sources = batch.sources.len(), "downloading batch");

        let downloads = self
            .dispatcher
            .download_batch(&batch.name, &batch.sources, self.layout.downloaded_dir())
            .await?;

        let incomplete_downloads = downloads.iter().filter(|d| d.is_incomplete()).count();
        if incomplete_downloads > 0 {
            warn!(
                batch = %batch.name,
                incomplete = incomplete_downloads,
                "some clips delivered fewer bytes than advertised"
            );
        }

        // Phase 2: normalize
        self.set_state(&batch.name, BatchState::Normalizing).await;
        if let Some(tx) = progress {
            let _ = tx
                .send(BatchEvent::Normalizing {
                    batch: batch.name.clone(),
                    total_clips: downloads.len(),
                })
                .await;
        }
        info!(batch = %batch.name, clips = downloads.len(), "normalizing batch");

        let clips = self.normalize_all(&batch.name, &downloads).await?;

        // Phase 3: merge and publish
        self.set_state(&batch.name, BatchState::Merging).await;
        if let Some(tx) = progress {
            let _ = tx
                .send(BatchEvent::Merging {
                    batch: batch.name.clone(),
                    total_clips: clips.len(),
                })
                .await;
        }
        info!(batch = %batch.name, clips = clips.len(), "merging batch");

        let output_path = self.merge(&batch.name, clips.clone()).await?;

        Ok(MergedBatch {
            batch_name: batch.name.clone(),
            output_path,
            clip_count: clips.len(),
            incomplete_downloads,
        })
    }

    /// Brings every downloaded clip to the canonical codecs and splits
    /// off its audio. Clips are processed concurrently under the
    /// transcode pool; results come back in sequence order.
    async fn normalize_all(
        &self,
        batch_name: &str,
        downloads: &[DownloadResult],
    ) -> Result<Vec<ClipStreams>, PipelineError> {
        let tasks = downloads.iter().map(|download| {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&self.transcode_semaphore);
            let normalized_dir = self.layout.normalized_dir().to_path_buf();
            let input = download.path.clone();
            let sequence_index = download.sequence_index;
            async move {
                let outcome = Self::normalize_one(engine, semaphore, normalized_dir, input).await;
                (sequence_index, outcome)
            }
        });

        let mut outcomes = join_all(tasks).await;
        outcomes.sort_by_key(|(sequence_index, _)| *sequence_index);

        let mut clips = Vec::with_capacity(outcomes.len());
        let mut sample_rates: Vec<u32> = Vec::new();
        for (_, outcome) in outcomes {
            let (clip, sample_rate) = outcome?;
            if let Some(rate) = sample_rate {
                if !sample_rates.contains(&rate) {
                    sample_rates.push(rate);
                }
            }
            clips.push(clip);
        }

        if sample_rates.len() > 1 {
            warn!(
                batch = batch_name,
                rates = ?sample_rates,
                "clips have mixed audio sample rates, the audio join may fail"
            );
        }

        Ok(clips)
    }

    async fn normalize_one(
        engine: Arc<E>,
        semaphore: Arc<Semaphore>,
        normalized_dir: PathBuf,
        input: PathBuf,
    ) -> Result<(ClipStreams, Option<u32>), PipelineError> {
        let _permit = semaphore.acquire().await.map_err(|_| {
            PipelineError::Normalize(EngineError::stage_failed(
                "normalize",
                "transcode pool closed",
                None,
            ))
        })?;

        let info = engine.probe(&input).await.map_err(PipelineError::Normalize)?;

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "clip".to_string());

        // A clip already in the canonical codecs is used as is
        let (video, audio_source) = if info.is_canonical() {
            debug!(input = %input.display(), "clip already canonical, transcode skipped");
            (input.clone(), input.clone())
        } else {
            let out = normalized_dir.join(format!("{stem}.mp4"));
            engine
                .normalize(&input, &out)
                .await
                .map_err(PipelineError::Normalize)?;
            (out.clone(), out)
        };

        // Audio is split from the canonical stream, so the extract is
        // always a lossless copy
        let audio = normalized_dir.join(format!("{stem}.aac"));
        engine
            .extract_audio(&audio_source, &audio)
            .await
            .map_err(PipelineError::Normalize)?;

        Ok((ClipStreams { video, audio }, info.audio_sample_rate))
    }

    /// Joins video and audio streams in scratch, muxes them, then
    /// promotes the finished file to the merged directory.
    async fn merge(
        &self,
        batch_name: &str,
        clips: Vec<ClipStreams>,
    ) -> Result<PathBuf, PipelineError> {
        let scratch = self.layout.batch_scratch(batch_name);
        tokio::fs::create_dir_all(&scratch)
            .await
            .map_err(PipelineError::Scratch)?;

        let job = MergeJob {
            batch_name: batch_name.to_string(),
            clips,
            output_path: self.layout.published_output(batch_name),
        };

        let video_inputs: Vec<PathBuf> = job.clips.iter().map(|c| c.video.clone()).collect();
        let audio_inputs: Vec<PathBuf> = job.clips.iter().map(|c| c.audio.clone()).collect();

        let joined_video = scratch.join(format!("{batch_name}-noaudio.mp4"));
        let joined_audio = scratch.join(format!("{batch_name}-audio.aac"));
        let staged = scratch.join(format!("{batch_name}.mp4"));

        self.engine
            .join_video(&video_inputs, &joined_video)
            .await
            .map_err(PipelineError::Merge)?;
        self.engine
            .join_audio(&audio_inputs, &joined_audio)
            .await
            .map_err(PipelineError::Merge)?;
        self.engine
            .mux(&joined_video, &joined_audio, &staged)
            .await
            .map_err(PipelineError::Merge)?;

        publish_file(&staged, &job.output_path)
            .await
            .map_err(|e| PipelineError::Publish {
                path: job.output_path.clone(),
                source: e,
            })?;

        Ok(job.output_path)
    }

    async fn set_state(&self, batch_name: &str, state: BatchState) {
        let mut active = self.active.write().await;
        active.insert(batch_name.to_string(), state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use crate::testing::fixtures::batch;
    use crate::testing::{MockEngine, MockFetcher};
    use tempfile::TempDir;

    fn pipeline(
        dir: &TempDir,
    ) -> (
        Arc<MockFetcher>,
        Arc<MockEngine>,
        BatchPipeline<MockFetcher, MockEngine>,
    ) {
        let layout = StorageLayout::rooted_at(dir.path(), &PathsConfig::default());
        let fetcher = Arc::new(MockFetcher::new());
        let engine = Arc::new(MockEngine::new());
        let pipeline = BatchPipeline::new(
            Dispatcher::new(Arc::clone(&fetcher), 4),
            Arc::clone(&engine),
            layout,
            2,
        );
        (fetcher, engine, pipeline)
    }

    #[test]
    fn test_failed_stage_mapping() {
        let err = PipelineError::Download(DownloadError::HttpStatus {
            status: 503,
            url: "https://x".to_string(),
        });
        assert_eq!(err.failed_stage(), BatchState::Downloading);

        let err = PipelineError::Normalize(EngineError::stage_failed("normalize", "boom", None));
        assert_eq!(err.failed_stage(), BatchState::Normalizing);

        let err = PipelineError::Merge(EngineError::stage_failed("mux", "boom", None));
        assert_eq!(err.failed_stage(), BatchState::Merging);
    }

    #[tokio::test]
    async fn test_run_batch_publishes_output() {
        let dir = TempDir::new().unwrap();
        let (_, _, pipeline) = pipeline(&dir);
        pipeline.layout().ensure().await.unwrap();

        let merged = pipeline
            .run_batch(
                &batch("intro", &["https://cdn.test/a.mp4", "https://cdn.test/b.mp4"]),
                None,
            )
            .await
            .unwrap();

        assert_eq!(merged.batch_name, "intro");
        assert_eq!(merged.clip_count, 2);
        assert!(merged.output_path.ends_with("merged/intro.mp4"));
        assert!(merged.output_path.exists());
        // Scratch is gone, the pipeline tracks nothing anymore
        assert!(!pipeline.layout().batch_scratch("intro").exists());
        assert!(pipeline.active_states().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_batch_failure_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let (fetcher, _, pipeline) = pipeline(&dir);
        pipeline.layout().ensure().await.unwrap();
        fetcher.set_failure("https://cdn.test/b.mp4").await;

        let result = pipeline
            .run_batch(
                &batch("intro", &["https://cdn.test/a.mp4", "https://cdn.test/b.mp4"]),
                None,
            )
            .await;

        assert!(matches!(result, Err(PipelineError::Download(_))));
        assert!(!pipeline.layout().published_output("intro").exists());
        assert!(pipeline.active_states().await.is_empty());
    }
}
