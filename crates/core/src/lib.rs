pub mod config;
pub mod downloader;
pub mod engine;
pub mod manifest;
pub mod orchestrator;
pub mod pipeline;
pub mod storage;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, MediatedConfig, PathsConfig,
};
pub use downloader::{
    destination_file_name, ClipFetcher, Dispatcher, DownloadError, DownloadResult,
    DownloaderConfig, FetchedClip, HttpDownloader, SourceRef,
};
pub use engine::{
    ClipStreams, EngineConfig, EngineError, FfmpegEngine, MediaEngine, MediaInfo, MergeJob,
};
pub use manifest::{load_manifest, resolve_batches, Batch, ManifestError, ManifestRow};
pub use orchestrator::{
    BatchOrchestrator, BatchReport, BatchState, OrchestratorConfig, OrchestratorError, RunSummary,
};
pub use pipeline::{BatchEvent, BatchPipeline, MergedBatch, PipelineError};
pub use storage::StorageLayout;
