//! Mock clip fetcher for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::downloader::{ClipFetcher, DownloadError, FetchedClip, SourceRef};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    /// Raw source string that was requested.
    pub source: String,
    /// Destination file name.
    pub file_name: String,
}

/// Mock implementation of the ClipFetcher trait.
///
/// Writes real placeholder files so downstream code can operate on the
/// filesystem, and provides controllable behavior:
/// - Track fetches for assertions
/// - Fail specific sources
/// - Delay specific sources to exercise ordering
/// - Report specific sources as incomplete
#[derive(Debug)]
pub struct MockFetcher {
    /// Recorded fetches, in completion order.
    calls: Arc<RwLock<Vec<RecordedFetch>>>,
    /// Sources that fail with an HTTP 503.
    failures: Arc<RwLock<HashSet<String>>>,
    /// Per-source artificial latency.
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    /// Sources reported shorter than advertised.
    incomplete: Arc<RwLock<HashSet<String>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashSet::new())),
            delays: Arc::new(RwLock::new(HashMap::new())),
            incomplete: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Get all recorded fetches, in the order they completed.
    pub async fn recorded_calls(&self) -> Vec<RecordedFetch> {
        self.calls.read().await.clone()
    }

    /// Get the number of fetches performed.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Make fetches of this source fail.
    pub async fn set_failure(&self, source: &str) {
        self.failures.write().await.insert(source.to_string());
    }

    /// Delay fetches of this source.
    pub async fn set_delay(&self, source: &str, delay: Duration) {
        self.delays.write().await.insert(source.to_string(), delay);
    }

    /// Make fetches of this source report fewer bytes than advertised.
    pub async fn set_incomplete(&self, source: &str) {
        self.incomplete.write().await.insert(source.to_string());
    }
}

#[async_trait]
impl ClipFetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        source: &SourceRef,
        dest_dir: &Path,
        file_name: &str,
    ) -> Result<FetchedClip, DownloadError> {
        let raw = source.as_str().to_string();

        if let Some(delay) = self.delays.read().await.get(&raw).copied() {
            tokio::time::sleep(delay).await;
        }

        self.calls.write().await.push(RecordedFetch {
            source: raw.clone(),
            file_name: file_name.to_string(),
        });

        if self.failures.read().await.contains(&raw) {
            return Err(DownloadError::HttpStatus {
                status: 503,
                url: raw,
            });
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(file_name);
        let content = format!("clip:{raw}");
        tokio::fs::write(&path, &content).await?;

        let bytes_received = content.len() as u64;
        let expected_bytes = if self.incomplete.read().await.contains(&raw) {
            Some(bytes_received + 1024)
        } else {
            Some(bytes_received)
        };

        Ok(FetchedClip {
            path,
            bytes_received,
            expected_bytes,
        })
    }
}
