//! Trait definitions for the media engine module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::EngineError;
use super::types::MediaInfo;

/// The external transcoding engine, expressed as the set of operations
/// the batch pipeline sequences. Every operation is a synchronous,
/// cancellable unit of work over local files.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its stream information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, EngineError>;

    /// Re-encodes a clip to the canonical codec pair. The clip's
    /// resolution is untouched; resolution is normalized by the join.
    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), EngineError>;

    /// Extracts the clip's first audio stream by lossless stream copy.
    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<(), EngineError>;

    /// Scales every input's video stream to the canonical resolution and
    /// concatenates them, in the given order, into one silent video file.
    async fn join_video(&self, inputs: &[PathBuf], output: &Path) -> Result<(), EngineError>;

    /// Concatenates the audio-only extracts, in the given order, into one
    /// audio file.
    async fn join_audio(&self, inputs: &[PathBuf], output: &Path) -> Result<(), EngineError>;

    /// Muxes a joined video stream (stream copy) and a joined audio
    /// stream (re-encoded to the canonical audio codec) into one
    /// container.
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), EngineError>;

    /// Validates that the engine is properly configured and ready.
    async fn validate(&self) -> Result<(), EngineError>;
}
