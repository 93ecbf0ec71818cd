use serde::{Deserialize, Serialize};

use crate::downloader::DownloaderConfig;
use crate::engine::EngineConfig;
use crate::orchestrator::OrchestratorConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub downloader: DownloaderConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Lookup API credentials for mediated sources. Without this
    /// section, manifests may only contain direct URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mediated: Option<MediatedConfig>,
}

/// Directory layout configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Where fetched clips land
    #[serde(default = "default_downloaded_dir")]
    pub downloaded: String,

    /// Where canonical-codec streams land
    #[serde(default = "default_normalized_dir")]
    pub normalized: String,

    /// Where finished batch outputs are published
    #[serde(default = "default_merged_dir")]
    pub merged: String,

    /// Root for per-batch intermediates, purged between runs
    #[serde(default = "default_scratch_dir")]
    pub scratch: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            downloaded: default_downloaded_dir(),
            normalized: default_normalized_dir(),
            merged: default_merged_dir(),
            scratch: default_scratch_dir(),
        }
    }
}

fn default_downloaded_dir() -> String {
    "downloaded".to_string()
}

fn default_normalized_dir() -> String {
    "normalized".to_string()
}

fn default_merged_dir() -> String {
    "merged".to_string()
}

fn default_scratch_dir() -> String {
    "temp".to_string()
}

/// Lookup API configuration for mediated sources
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediatedConfig {
    /// Base URL of the asset lookup endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key sent in the Authorization header
    pub api_key: String,
}

fn default_api_url() -> String {
    "https://api.synthesia.io/v2/videos".to_string()
}
