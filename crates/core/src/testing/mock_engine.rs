//! Mock media engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::{
    EngineError, MediaEngine, MediaInfo, CANONICAL_AUDIO_CODEC, CANONICAL_VIDEO_CODEC,
};

/// A recorded engine call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Probe {
        input: PathBuf,
    },
    Normalize {
        input: PathBuf,
        output: PathBuf,
    },
    ExtractAudio {
        input: PathBuf,
        output: PathBuf,
    },
    JoinVideo {
        inputs: Vec<PathBuf>,
        output: PathBuf,
    },
    JoinAudio {
        inputs: Vec<PathBuf>,
        output: PathBuf,
    },
    Mux {
        video: PathBuf,
        audio: PathBuf,
        output: PathBuf,
    },
}

/// Mock implementation of the MediaEngine trait.
///
/// Every operation writes a real placeholder output file so the
/// pipeline's filesystem handling can be exercised end to end.
/// Controllable behavior:
/// - Track calls for assertions
/// - Probe results per path (unknown paths probe as canonical clips)
/// - Fail a specific operation once
#[derive(Debug)]
pub struct MockEngine {
    /// Recorded calls, in completion order.
    calls: Arc<RwLock<Vec<EngineCall>>>,
    /// Pre-configured probe results by path.
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaInfo>>>,
    /// Next failure per operation name, consumed when hit.
    failures: Arc<RwLock<HashMap<String, EngineError>>>,
    /// If set, validate() fails with this error.
    validate_failure: Arc<RwLock<Option<EngineError>>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            validate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all recorded calls, in the order they completed.
    pub async fn recorded_calls(&self) -> Vec<EngineCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of calls performed.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Set a probe result for a specific path.
    pub async fn set_probe(&self, path: impl AsRef<Path>, info: MediaInfo) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), info);
    }

    /// Make the next call of `op` fail. Operation names are
    /// "probe", "normalize", "extract_audio", "join_video",
    /// "join_audio" and "mux".
    pub async fn set_failure(&self, op: &str, error: EngineError) {
        self.failures.write().await.insert(op.to_string(), error);
    }

    /// Make validate() fail with the given error.
    pub async fn set_validate_failure(&self, error: EngineError) {
        *self.validate_failure.write().await = Some(error);
    }

    /// A canonical-codec MediaInfo for the given path.
    pub fn canonical_info(path: &Path) -> MediaInfo {
        MediaInfo {
            path: path.to_path_buf(),
            size_bytes: 1_000_000,
            duration_secs: 10.0,
            format: "mov".to_string(),
            video_codec: Some(CANONICAL_VIDEO_CODEC.to_string()),
            video_width: Some(1280),
            video_height: Some(720),
            audio_codec: Some(CANONICAL_AUDIO_CODEC.to_string()),
            audio_sample_rate: Some(48000),
        }
    }

    /// A MediaInfo that requires a transcode.
    pub fn non_canonical_info(path: &Path) -> MediaInfo {
        MediaInfo {
            path: path.to_path_buf(),
            size_bytes: 1_000_000,
            duration_secs: 10.0,
            format: "matroska".to_string(),
            video_codec: Some("vp9".to_string()),
            video_width: Some(640),
            video_height: Some(360),
            audio_codec: Some("opus".to_string()),
            audio_sample_rate: Some(48000),
        }
    }

    async fn take_failure(&self, op: &str) -> Option<EngineError> {
        self.failures.write().await.remove(op)
    }

    async fn record(&self, call: EngineCall) {
        self.calls.write().await.push(call);
    }

    async fn write_output(output: &Path, content: &str) -> Result<(), EngineError> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, content).await?;
        Ok(())
    }
}

#[async_trait]
impl MediaEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, EngineError> {
        self.record(EngineCall::Probe {
            input: path.to_path_buf(),
        })
        .await;

        if let Some(err) = self.take_failure("probe").await {
            return Err(err);
        }

        if let Some(info) = self.probe_results.read().await.get(path) {
            return Ok(info.clone());
        }
        Ok(Self::canonical_info(path))
    }

    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), EngineError> {
        self.record(EngineCall::Normalize {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        })
        .await;

        if let Some(err) = self.take_failure("normalize").await {
            return Err(err);
        }
        Self::write_output(output, "normalized").await
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<(), EngineError> {
        self.record(EngineCall::ExtractAudio {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        })
        .await;

        if let Some(err) = self.take_failure("extract_audio").await {
            return Err(err);
        }
        Self::write_output(output, "audio").await
    }

    async fn join_video(&self, inputs: &[PathBuf], output: &Path) -> Result<(), EngineError> {
        self.record(EngineCall::JoinVideo {
            inputs: inputs.to_vec(),
            output: output.to_path_buf(),
        })
        .await;

        if let Some(err) = self.take_failure("join_video").await {
            return Err(err);
        }
        Self::write_output(output, "joined-video").await
    }

    async fn join_audio(&self, inputs: &[PathBuf], output: &Path) -> Result<(), EngineError> {
        self.record(EngineCall::JoinAudio {
            inputs: inputs.to_vec(),
            output: output.to_path_buf(),
        })
        .await;

        if let Some(err) = self.take_failure("join_audio").await {
            return Err(err);
        }
        Self::write_output(output, "joined-audio").await
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), EngineError> {
        self.record(EngineCall::Mux {
            video: video.to_path_buf(),
            audio: audio.to_path_buf(),
            output: output.to_path_buf(),
        })
        .await;

        if let Some(err) = self.take_failure("mux").await {
            return Err(err);
        }
        Self::write_output(output, "muxed").await
    }

    async fn validate(&self) -> Result<(), EngineError> {
        if let Some(err) = self.validate_failure.write().await.take() {
            return Err(err);
        }
        Ok(())
    }
}
