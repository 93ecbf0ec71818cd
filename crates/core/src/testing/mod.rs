//! Testing utilities and mock implementations for pipeline tests.
//!
//! This module provides mock implementations of the fetcher and engine
//! traits, allowing full pipeline testing without a network or an
//! ffmpeg install. Both mocks write real placeholder files so the
//! filesystem handling is exercised for real.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelstitch_core::testing::{MockEngine, MockFetcher};
//!
//! let fetcher = MockFetcher::new();
//! let engine = MockEngine::new();
//!
//! // Configure mock behavior
//! fetcher.set_failure("https://cdn.test/broken.mp4").await;
//! engine.set_failure("mux", error).await;
//!
//! // Use in a BatchPipeline...
//! ```

mod mock_engine;
mod mock_fetcher;

pub use mock_engine::{EngineCall, MockEngine};
pub use mock_fetcher::{MockFetcher, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::downloader::SourceRef;
    use crate::manifest::Batch;

    /// Create a batch whose sources are parsed from raw strings.
    pub fn batch(name: &str, sources: &[&str]) -> Batch {
        Batch {
            name: name.to_string(),
            sources: sources.iter().map(|s| SourceRef::parse(s)).collect(),
        }
    }

    /// Create manifest JSON from (name, source, order) rows.
    pub fn manifest_json(rows: &[(&str, &str, u32)]) -> String {
        let rows: Vec<String> = rows
            .iter()
            .map(|(name, source, order)| {
                format!(
                    r#"{{"name": "{name}", "source": "{source}", "order": {order}}}"#
                )
            })
            .collect();
        format!("[{}]", rows.join(","))
    }
}
