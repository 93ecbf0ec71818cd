//! Manifest loading and batch resolution.

use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::types::{Batch, ManifestRow};
use super::ManifestError;
use crate::downloader::SourceRef;

/// Groups manifest rows into batches.
///
/// Batches appear in the order their name first occurs; rows with a
/// name seen before append to that batch, even when other batches sit
/// in between. Within a batch, sources are sorted by their `order`
/// field; rows with equal orders keep their manifest position.
pub fn resolve_batches(rows: &[ManifestRow]) -> Result<Vec<Batch>, ManifestError> {
    let mut batch_order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<(u32, SourceRef)>> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        let row_number = i + 1;

        let name = row.name.trim();
        if name.is_empty() {
            return Err(ManifestError::EmptyName { row: row_number });
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(ManifestError::UnsafeName {
                name: name.to_string(),
            });
        }

        let source = row.source.trim();
        if source.is_empty() {
            return Err(ManifestError::EmptySource { row: row_number });
        }

        let entry = grouped.entry(name.to_string()).or_insert_with(|| {
            batch_order.push(name.to_string());
            Vec::new()
        });
        entry.push((row.order, SourceRef::parse(source)));
    }

    let batches = batch_order
        .into_iter()
        .map(|name| {
            let mut sources = grouped.remove(&name).unwrap_or_default();
            // Stable sort keeps manifest order for equal keys
            sources.sort_by_key(|(order, _)| *order);
            Batch {
                name,
                sources: sources.into_iter().map(|(_, source)| source).collect(),
            }
        })
        .collect();

    Ok(batches)
}

/// Loads a JSON manifest from disk and resolves it into batches.
pub async fn load_manifest(path: &Path) -> Result<Vec<Batch>, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::FileNotFound(path.display().to_string()));
    }

    let raw = tokio::fs::read_to_string(path).await?;
    let rows: Vec<ManifestRow> =
        serde_json::from_str(&raw).map_err(|e| ManifestError::Parse(e.to_string()))?;

    let batches = resolve_batches(&rows)?;
    debug!(
        path = %path.display(),
        rows = rows.len(),
        batches = batches.len(),
        "manifest resolved"
    );
    Ok(batches)
}
