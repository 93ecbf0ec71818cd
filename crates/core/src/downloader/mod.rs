//! Clip acquisition: source classification, fetching and batch dispatch.
//!
//! Sources come in two shapes. Direct URLs (http, https, file) are
//! streamed straight to disk; opaque asset ids are first resolved to a
//! signed download URL through the lookup API. The [`Dispatcher`] fans
//! a batch's sources out over a bounded pool while keeping results in
//! manifest order.

mod config;
mod dispatcher;
mod error;
mod http;
mod traits;
mod types;

pub use config::DownloaderConfig;
pub use dispatcher::{destination_file_name, Dispatcher};
pub use error::DownloadError;
pub use http::HttpDownloader;
pub use traits::ClipFetcher;
pub use types::{DownloadResult, FetchedClip, SourceRef};
