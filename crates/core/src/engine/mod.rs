//! Media engine for probing, transcoding and joining clips.
//!
//! The [`MediaEngine`] trait abstracts over the media toolchain so the
//! pipeline can be tested without spawning processes. [`FfmpegEngine`]
//! is the production implementation backed by ffmpeg/ffprobe.

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::EngineConfig;
pub use error::EngineError;
pub use ffmpeg::FfmpegEngine;
pub use traits::MediaEngine;
pub use types::{ClipStreams, MediaInfo, MergeJob, CANONICAL_AUDIO_CODEC, CANONICAL_VIDEO_CODEC};
