//! FFmpeg-based media engine implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::EngineConfig;
use super::error::EngineError;
use super::traits::MediaEngine;
use super::types::{MediaInfo, CANONICAL_AUDIO_CODEC};

/// FFmpeg-based media engine implementation.
pub struct FfmpegEngine {
    config: EngineConfig,
}

impl FfmpegEngine {
    /// Creates a new FFmpeg engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Builds ffmpeg arguments for the canonical codec transcode.
    fn build_normalize_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.config.preset.clone(),
        ];

        if let Some(crf) = self.config.crf {
            args.extend(["-crf".to_string(), crf.to_string()]);
        }

        args.extend(["-c:a".to_string(), CANONICAL_AUDIO_CODEC.to_string()]);

        if let Some(bitrate) = self.config.audio_bitrate_kbps {
            args.extend(["-b:a".to_string(), format!("{}k", bitrate)]);
        }

        args.extend(self.tail_args());
        args.push(output.to_string_lossy().to_string());
        args
    }

    /// Builds ffmpeg arguments for the lossless audio extract.
    fn build_extract_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            // First audio stream only, no re-encode
            "-map".to_string(),
            "0:a:0".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
        ];
        args.extend(self.tail_args());
        args.push(output.to_string_lossy().to_string());
        args
    }

    /// Builds ffmpeg arguments for the silent video join.
    fn build_video_join_args(&self, inputs: &[PathBuf], output: &Path) -> Vec<String> {
        let mut args = vec!["-y".to_string()];
        for input in inputs {
            args.extend(["-i".to_string(), input.to_string_lossy().to_string()]);
        }

        args.extend([
            "-filter_complex".to_string(),
            Self::video_join_filter(
                inputs.len(),
                self.config.target_width,
                self.config.target_height,
            ),
            "-map".to_string(),
            "[outv]".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.config.preset.clone(),
        ]);

        if let Some(crf) = self.config.crf {
            args.extend(["-crf".to_string(), crf.to_string()]);
        }

        args.extend(self.tail_args());
        args.push(output.to_string_lossy().to_string());
        args
    }

    /// Builds ffmpeg arguments for the audio join.
    fn build_audio_join_args(&self, inputs: &[PathBuf], output: &Path) -> Vec<String> {
        let mut args = vec!["-y".to_string()];
        for input in inputs {
            args.extend(["-i".to_string(), input.to_string_lossy().to_string()]);
        }

        args.extend([
            "-filter_complex".to_string(),
            Self::audio_join_filter(inputs.len()),
            "-map".to_string(),
            "[outa]".to_string(),
            "-c:a".to_string(),
            CANONICAL_AUDIO_CODEC.to_string(),
        ]);

        if let Some(bitrate) = self.config.audio_bitrate_kbps {
            args.extend(["-b:a".to_string(), format!("{}k", bitrate)]);
        }

        args.extend(self.tail_args());
        args.push(output.to_string_lossy().to_string());
        args
    }

    /// Builds ffmpeg arguments for the final mux.
    fn build_mux_args(&self, video: &Path, audio: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-i".to_string(),
            audio.to_string_lossy().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            // Joined video was re-encoded by the join, copy it as is
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            CANONICAL_AUDIO_CODEC.to_string(),
        ];

        if let Some(bitrate) = self.config.audio_bitrate_kbps {
            args.extend(["-b:a".to_string(), format!("{}k", bitrate)]);
        }

        args.extend(self.tail_args());
        args.push(output.to_string_lossy().to_string());
        args
    }

    /// Log level and progress arguments appended to every invocation.
    fn tail_args(&self) -> [String; 4] {
        [
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]
    }

    /// Builds the filter graph scaling every clip to the target
    /// resolution (aspect preserved, centered pad) and concatenating the
    /// scaled streams in input order.
    fn video_join_filter(count: usize, width: u32, height: u32) -> String {
        let mut filter = String::new();
        for i in 0..count {
            filter.push_str(&format!(
                "[{i}:v]scale={width}:{height}:force_original_aspect_ratio=decrease,\
                 pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1[v{i}];"
            ));
        }
        for i in 0..count {
            filter.push_str(&format!("[v{i}]"));
        }
        filter.push_str(&format!("concat=n={count}:v=1:a=0[outv]"));
        filter
    }

    /// Builds the filter graph concatenating audio extracts in input
    /// order.
    fn audio_join_filter(count: usize) -> String {
        let mut filter = String::new();
        for i in 0..count {
            filter.push_str(&format!("[{i}:a]"));
        }
        filter.push_str(&format!("concat=n={count}:v=0:a=1[outa]"));
        filter
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, EngineError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            sample_rate: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| EngineError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");
        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
            audio_sample_rate: audio_stream
                .and_then(|s| s.sample_rate.as_ref())
                .and_then(|r| r.parse::<u32>().ok()),
        })
    }

    /// Ensures the output's parent directory exists.
    async fn ensure_parent(output: &Path) -> Result<(), EngineError> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                EngineError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }
        Ok(())
    }

    /// Runs one ffmpeg invocation to completion, draining stderr for
    /// progress lines and error output, enforcing the configured timeout.
    async fn run_ffmpeg(
        &self,
        stage: &str,
        args: Vec<String>,
        output: &Path,
    ) -> Result<(), EngineError> {
        Self::ensure_parent(output).await?;

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    EngineError::Io(e)
                }
            })?;

        let stderr = child.stderr.take().expect("stderr should be captured");
        let mut reader = BufReader::new(stderr).lines();

        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();
        let speed_regex = Regex::new(r"speed=(\d+\.?\d*)x").ok();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut last_progress_log = Instant::now();
            let progress_interval = Duration::from_millis(500);
            let mut current_time = 0.0;
            let mut current_speed: Option<String> = None;
            let mut error_output = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                // Capture error output for the failure message
                if line.contains("Error") || line.contains("error") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }

                if let Some(ref re) = time_regex {
                    if let Some(caps) = re.captures(&line) {
                        if let Some(ms_str) = caps.get(1) {
                            if let Ok(ms) = ms_str.as_str().parse::<f64>() {
                                current_time = ms / 1_000_000.0; // Microseconds to seconds
                            }
                        }
                    }
                }

                if let Some(ref re) = speed_regex {
                    if let Some(caps) = re.captures(&line) {
                        if let Some(speed_str) = caps.get(1) {
                            current_speed = Some(format!("{}x", speed_str.as_str()));
                        }
                    }
                }

                if last_progress_log.elapsed() >= progress_interval {
                    debug!(
                        stage = stage,
                        time_secs = current_time,
                        speed = current_speed.as_deref().unwrap_or("-"),
                        "transcode progress"
                    );
                    last_progress_log = Instant::now();
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(EngineError::stage_failed(
                        stage,
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(EngineError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                return Err(EngineError::Timeout {
                    stage: stage.to_string(),
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        // Verify the output actually materialized
        tokio::fs::metadata(output)
            .await
            .map_err(|_| EngineError::stage_failed(stage, "output file not created", None))?;

        Ok(())
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, EngineError> {
        if !path.exists() {
            return Err(EngineError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    EngineError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(EngineError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), EngineError> {
        let args = self.build_normalize_args(input, output);
        self.run_ffmpeg("normalize", args, output).await
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<(), EngineError> {
        let args = self.build_extract_args(input, output);
        self.run_ffmpeg("audio extract", args, output).await
    }

    async fn join_video(&self, inputs: &[PathBuf], output: &Path) -> Result<(), EngineError> {
        if inputs.is_empty() {
            return Err(EngineError::stage_failed("video join", "no input clips", None));
        }
        let args = self.build_video_join_args(inputs, output);
        self.run_ffmpeg("video join", args, output).await
    }

    async fn join_audio(&self, inputs: &[PathBuf], output: &Path) -> Result<(), EngineError> {
        if inputs.is_empty() {
            return Err(EngineError::stage_failed("audio join", "no input clips", None));
        }
        let args = self.build_audio_join_args(inputs, output);
        self.run_ffmpeg("audio join", args, output).await
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), EngineError> {
        let args = self.build_mux_args(video, audio, output);
        self.run_ffmpeg("mux", args, output).await
    }

    async fn validate(&self) -> Result<(), EngineError> {
        // Check ffmpeg exists
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(EngineError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(EngineError::Io(e));
        }

        // Check ffprobe exists
        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(EngineError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(EngineError::Io(e));
        }

        Ok(())
    }
}
