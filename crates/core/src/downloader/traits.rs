use async_trait::async_trait;
use std::path::Path;

use super::error::DownloadError;
use super::types::{FetchedClip, SourceRef};

/// Trait for fetching a single clip to local disk.
#[async_trait]
pub trait ClipFetcher: Send + Sync {
    /// Name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Fetches `source` into `dest_dir` under `file_name`.
    ///
    /// Mediated sources are resolved to a signed URL first. The file is
    /// written in full before this returns; a short read against a
    /// known content length is reported through
    /// [`FetchedClip::is_incomplete`], not as an error.
    async fn fetch(
        &self,
        source: &SourceRef,
        dest_dir: &Path,
        file_name: &str,
    ) -> Result<FetchedClip, DownloadError>;
}
