//! Configuration for the media engine module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based media engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Canonical output width every clip is scaled to before joining.
    #[serde(default = "default_target_width")]
    pub target_width: u32,

    /// Canonical output height every clip is scaled to before joining.
    #[serde(default = "default_target_height")]
    pub target_height: u32,

    /// x264 preset for re-encoding invocations.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, lower is better). When unset the
    /// encoder default applies.
    #[serde(default)]
    pub crf: Option<u8>,

    /// Audio bitrate in kbps for re-encoding invocations. When unset the
    /// encoder default applies.
    #[serde(default)]
    pub audio_bitrate_kbps: Option<u32>,

    /// Maximum concurrent transcode invocations across all batches.
    #[serde(default = "default_max_parallel")]
    pub max_parallel_transcodes: usize,

    /// Timeout for a single ffmpeg invocation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info,
    /// verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_target_width() -> u32 {
    1280
}

fn default_target_height() -> u32 {
    720
}

fn default_preset() -> String {
    "ultrafast".to_string()
}

fn default_max_parallel() -> usize {
    2
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_log_level() -> String {
    "warning".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            target_width: default_target_width(),
            target_height: default_target_height(),
            preset: default_preset(),
            crf: None,
            audio_bitrate_kbps: None,
            max_parallel_transcodes: default_max_parallel(),
            timeout_secs: default_timeout(),
            ffmpeg_log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the canonical target resolution.
    pub fn with_target_resolution(mut self, width: u32, height: u32) -> Self {
        self.target_width = width;
        self.target_height = height;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.ffprobe_path, PathBuf::from("ffprobe"));
        assert_eq!(config.target_width, 1280);
        assert_eq!(config.target_height, 720);
        assert_eq!(config.preset, "ultrafast");
        assert_eq!(config.max_parallel_transcodes, 2);
        assert_eq!(config.timeout_secs, 3600);
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::with_paths(
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffprobe"),
        )
        .with_target_resolution(1920, 1080)
        .with_timeout(7200);

        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.target_width, 1920);
        assert_eq!(config.target_height, 1080);
        assert_eq!(config.timeout_secs, 7200);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            preset = "veryfast"
            crf = 23
        "#;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.preset, "veryfast");
        assert_eq!(config.crf, Some(23));
        assert_eq!(config.target_width, 1280);
        assert_eq!(config.ffmpeg_log_level, "warning");
    }

    #[test]
    fn test_config_serialization() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.target_width, config.target_width);
        assert_eq!(parsed.max_parallel_transcodes, config.max_parallel_transcodes);
    }
}
