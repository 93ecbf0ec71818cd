//! Error types for the media engine module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while invoking the external transcoding engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// An ffmpeg invocation failed.
    #[error("{stage} failed: {reason}")]
    StageFailed {
        stage: String,
        reason: String,
        stderr: Option<String>,
    },

    /// An ffmpeg invocation exceeded the configured timeout.
    #[error("{stage} timed out after {timeout_secs} seconds")]
    Timeout { stage: String, timeout_secs: u64 },

    /// Failed to probe a media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Failed to parse FFprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// I/O error during an engine operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a new stage failure with optional stderr output.
    pub fn stage_failed(
        stage: impl Into<String>,
        reason: impl Into<String>,
        stderr: Option<String>,
    ) -> Self {
        Self::StageFailed {
            stage: stage.into(),
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }
}
