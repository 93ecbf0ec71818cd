use serde::{Deserialize, Serialize};

/// Configuration for the clip downloader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Timeout for establishing connections, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Timeout for the whole asset lookup request, in seconds.
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,

    /// Max time between received chunks before a download counts as
    /// stalled, in seconds.
    #[serde(default = "default_stall_timeout_secs")]
    pub stall_timeout_secs: u64,

    /// How many clips of one batch are fetched concurrently.
    #[serde(default = "default_max_parallel_downloads")]
    pub max_parallel_downloads: usize,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_lookup_timeout_secs() -> u64 {
    30
}

fn default_stall_timeout_secs() -> u64 {
    120
}

fn default_max_parallel_downloads() -> usize {
    4
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
            stall_timeout_secs: default_stall_timeout_secs(),
            max_parallel_downloads: default_max_parallel_downloads(),
        }
    }
}

impl DownloaderConfig {
    pub fn with_max_parallel_downloads(mut self, max: usize) -> Self {
        self.max_parallel_downloads = max;
        self
    }
}
