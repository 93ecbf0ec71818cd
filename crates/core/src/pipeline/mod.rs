//! Batch processing pipeline.
//!
//! Takes a resolved batch through its stages in order:
//! - **Download**: concurrent fetches, results in manifest order
//! - **Normalize**: canonical-codec transcode where needed, audio split
//! - **Merge**: video join, audio join, mux, then publish
//!
//! Every intermediate lives in per-batch scratch; only a finished
//! output is promoted to the merged directory.

mod pipeline;
mod publish;
mod types;

pub use pipeline::{BatchPipeline, PipelineError};
pub use publish::publish_file;
pub use types::{BatchEvent, MergedBatch};
