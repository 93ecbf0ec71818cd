//! Input manifest parsing and batch resolution.
//!
//! A manifest is a JSON array of rows, each naming a batch, a source
//! and the clip's order within the batch. Rows sharing a name form one
//! batch regardless of where they sit in the file.

mod resolver;
mod types;

pub use resolver::{load_manifest, resolve_batches};
pub use types::{Batch, ManifestRow};

use thiserror::Error;

/// Errors from loading or resolving a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest file not found: {0}")]
    FileNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse manifest: {0}")]
    Parse(String),

    #[error("manifest row {row} has an empty batch name")]
    EmptyName { row: usize },

    #[error("manifest row {row} has an empty source")]
    EmptySource { row: usize },

    #[error("batch name {name:?} is not usable as a file name")]
    UnsafeName { name: String },
}
