//! Concurrent batch download dispatch.

use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::error::DownloadError;
use super::traits::ClipFetcher;
use super::types::{DownloadResult, FetchedClip, SourceRef};

/// Destination file name for one clip of a batch.
///
/// The 1-based sequence index is zero-padded so lexical directory
/// order matches manifest order for batches of up to 999 clips.
pub fn destination_file_name(batch_name: &str, sequence_index: usize, extension: &str) -> String {
    format!("{batch_name}-{sequence_index:03}.{extension}")
}

/// Fans a batch's sources out over a fetcher pool.
///
/// Clips are fetched concurrently but results always come back in
/// manifest order. Any failed fetch fails the whole batch.
pub struct Dispatcher<F: ClipFetcher> {
    fetcher: Arc<F>,
    max_parallel: usize,
}

impl<F: ClipFetcher> Dispatcher<F> {
    pub fn new(fetcher: Arc<F>, max_parallel: usize) -> Self {
        Self {
            fetcher,
            max_parallel,
        }
    }

    /// Downloads every source of a batch into `dest_dir`.
    ///
    /// On success the returned results are sorted by sequence index.
    /// On failure the error of the lowest-indexed failing source is
    /// returned.
    pub async fn download_batch(
        &self,
        batch_name: &str,
        sources: &[SourceRef],
        dest_dir: &Path,
    ) -> Result<Vec<DownloadResult>, DownloadError> {
        debug!(
            batch = batch_name,
            sources = sources.len(),
            fetcher = self.fetcher.name(),
            "dispatching batch downloads"
        );

        let fetches = sources.iter().enumerate().map(|(i, source)| {
            let fetcher = Arc::clone(&self.fetcher);
            let sequence_index = i + 1;
            let file_name =
                destination_file_name(batch_name, sequence_index, source.preferred_extension());
            let source = source.clone();
            let dest_dir = dest_dir.to_path_buf();
            async move {
                let outcome = fetcher.fetch(&source, &dest_dir, &file_name).await;
                (sequence_index, outcome)
            }
        });

        let mut outcomes: Vec<(usize, Result<FetchedClip, DownloadError>)> =
            stream::iter(fetches)
                .buffer_unordered(self.max_parallel.max(1))
                .collect()
                .await;
        outcomes.sort_by_key(|(sequence_index, _)| *sequence_index);

        let mut results = Vec::with_capacity(outcomes.len());
        for (sequence_index, outcome) in outcomes {
            let clip = outcome?;
            results.push(DownloadResult {
                sequence_index,
                path: clip.path,
                bytes_received: clip.bytes_received,
                expected_bytes: clip.expected_bytes,
            });
        }
        Ok(results)
    }
}
