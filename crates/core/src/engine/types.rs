//! Types for the media engine module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Video codec every clip is normalized to before joining.
pub const CANONICAL_VIDEO_CODEC: &str = "h264";

/// Audio codec every clip is normalized to before joining.
pub const CANONICAL_AUDIO_CODEC: &str = "aac";

/// Information about a media file, as reported by ffprobe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// File path.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Container format (e.g., "mov", "matroska").
    pub format: String,
    /// Video codec (if a video stream is present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    /// Video width (if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_width: Option<u32>,
    /// Video height (if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_height: Option<u32>,
    /// Audio codec (if an audio stream is present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    /// Audio sample rate in Hz (if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_sample_rate: Option<u32>,
}

impl MediaInfo {
    /// Whether the file already carries the canonical codec pair and can
    /// skip the normalize transcode.
    pub fn is_canonical(&self) -> bool {
        self.video_codec.as_deref() == Some(CANONICAL_VIDEO_CODEC)
            && self.audio_codec.as_deref() == Some(CANONICAL_AUDIO_CODEC)
    }
}

/// The per-clip stream pair entering the merge: a normalized video file
/// and its companion audio-only extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipStreams {
    /// Path to the clip with canonical codecs.
    pub video: PathBuf,
    /// Path to the audio-only extract.
    pub audio: PathBuf,
}

/// Everything needed to merge one batch. Transient, lives only for the
/// duration of the merge.
#[derive(Debug, Clone)]
pub struct MergeJob {
    /// Batch name, used to key scratch and output filenames.
    pub batch_name: String,
    /// Clip streams in source order. The merged timeline follows this
    /// order exactly.
    pub clips: Vec<ClipStreams>,
    /// Published output path for the merged file.
    pub output_path: PathBuf,
}
