use serde::{Deserialize, Serialize};

use crate::downloader::SourceRef;

/// One row of the input manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestRow {
    /// Batch this clip belongs to.
    pub name: String,
    /// Direct URL or opaque asset id.
    pub source: String,
    /// Position of the clip within its batch.
    pub order: u32,
}

/// A named batch with its sources in final playback order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub name: String,
    pub sources: Vec<SourceRef>,
}
