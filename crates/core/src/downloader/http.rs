//! HTTP clip fetcher.
//!
//! Fetches direct URLs by streaming the response body to disk and
//! resolves opaque asset ids through the lookup API first. `file://`
//! URLs are copied straight from the local filesystem, which keeps
//! manifests usable without a network.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};
use url::Url;

use super::config::DownloaderConfig;
use super::error::DownloadError;
use super::traits::ClipFetcher;
use super::types::{FetchedClip, SourceRef};
use crate::config::MediatedConfig;

/// Response body of the asset lookup API.
#[derive(Debug, Deserialize)]
struct AssetLookupResponse {
    download: Option<String>,
}

/// Production fetcher backed by reqwest.
pub struct HttpDownloader {
    client: reqwest::Client,
    config: DownloaderConfig,
    mediated: Option<MediatedConfig>,
}

impl HttpDownloader {
    /// Creates a new downloader. `mediated` carries the lookup API
    /// credentials; without it, asset id sources fail to resolve.
    pub fn new(
        config: DownloaderConfig,
        mediated: Option<MediatedConfig>,
    ) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            mediated,
        })
    }

    /// Lookup endpoint for an asset id.
    fn lookup_url(api_url: &str, id: &str) -> String {
        format!("{}/{}", api_url.trim_end_matches('/'), urlencoding::encode(id))
    }

    /// Resolves an opaque asset id to its signed download URL.
    async fn resolve_signed_url(&self, id: &str) -> Result<String, DownloadError> {
        let mediated =
            self.mediated
                .as_ref()
                .ok_or_else(|| DownloadError::MissingCredentials {
                    id: id.to_string(),
                })?;

        let url = Self::lookup_url(&mediated.api_url, id);
        debug!(id = id, "resolving asset download url");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, &mediated.api_key)
            .header(ACCEPT, "application/json")
            .timeout(Duration::from_secs(self.config.lookup_timeout_secs))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::LookupStatus {
                status: status.as_u16(),
                id: id.to_string(),
            });
        }

        let body: AssetLookupResponse = response.json().await.map_err(|e| {
            DownloadError::resolution(id, format!("invalid lookup response: {}", e))
        })?;

        body.download
            .ok_or_else(|| DownloadError::resolution(id, "response has no download url"))
    }

    /// Streams `url` to `dest`, returning received and advertised byte
    /// counts. Local `file://` URLs are copied instead of fetched.
    async fn stream_to_file(
        &self,
        url: &str,
        dest: &Path,
    ) -> Result<(u64, Option<u64>), DownloadError> {
        if let Ok(parsed) = Url::parse(url) {
            if parsed.scheme() == "file" {
                let source = parsed
                    .to_file_path()
                    .map_err(|_| DownloadError::InvalidFileUrl(url.to_string()))?;
                let bytes = fs::copy(&source, dest).await?;
                return Ok((bytes, Some(bytes)));
            }
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let expected = response.content_length();
        let mut stream = response.bytes_stream();
        let mut file = fs::File::create(dest).await?;
        let mut received: u64 = 0;

        let stall = Duration::from_secs(self.config.stall_timeout_secs);
        loop {
            match timeout(stall, stream.next()).await {
                Err(_) => {
                    return Err(DownloadError::Stalled {
                        timeout_secs: self.config.stall_timeout_secs,
                        url: url.to_string(),
                    });
                }
                Ok(None) => break,
                Ok(Some(chunk)) => {
                    let chunk = chunk?;
                    file.write_all(&chunk).await?;
                    received += chunk.len() as u64;
                }
            }
        }
        file.flush().await?;

        Ok((received, expected))
    }
}

#[async_trait]
impl ClipFetcher for HttpDownloader {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(
        &self,
        source: &SourceRef,
        dest_dir: &Path,
        file_name: &str,
    ) -> Result<FetchedClip, DownloadError> {
        fs::create_dir_all(dest_dir).await?;
        let dest = dest_dir.join(file_name);

        let url = match source {
            SourceRef::Url(url) => url.clone(),
            SourceRef::AssetId(id) => self.resolve_signed_url(id).await?,
        };

        debug!(source = %source, dest = %dest.display(), "fetching clip");
        let (bytes_received, expected_bytes) = self.stream_to_file(&url, &dest).await?;

        let clip = FetchedClip {
            path: dest,
            bytes_received,
            expected_bytes,
        };
        if clip.is_incomplete() {
            warn!(
                path = %clip.path.display(),
                received = clip.bytes_received,
                expected = ?clip.expected_bytes,
                "received fewer bytes than advertised"
            );
        }

        Ok(clip)
    }
}
