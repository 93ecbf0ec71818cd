//! Working directory layout for a pipeline run.
//!
//! Downloads, normalized streams and published outputs each get their
//! own directory; per-batch intermediates live under a scratch root
//! that is purged between runs. Outputs only ever reach the merged
//! directory through a promote step, so a crash never leaves a partial
//! file there.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::PathsConfig;

/// The four working directories of a run.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    downloaded: PathBuf,
    normalized: PathBuf,
    merged: PathBuf,
    scratch: PathBuf,
}

impl StorageLayout {
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            downloaded: PathBuf::from(&paths.downloaded),
            normalized: PathBuf::from(&paths.normalized),
            merged: PathBuf::from(&paths.merged),
            scratch: PathBuf::from(&paths.scratch),
        }
    }

    /// Roots all four directories under `base`.
    pub fn rooted_at(base: &Path, paths: &PathsConfig) -> Self {
        Self {
            downloaded: base.join(&paths.downloaded),
            normalized: base.join(&paths.normalized),
            merged: base.join(&paths.merged),
            scratch: base.join(&paths.scratch),
        }
    }

    pub fn downloaded_dir(&self) -> &Path {
        &self.downloaded
    }

    pub fn normalized_dir(&self) -> &Path {
        &self.normalized
    }

    pub fn merged_dir(&self) -> &Path {
        &self.merged
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch
    }

    /// Scratch directory reserved for one batch's intermediates.
    pub fn batch_scratch(&self, batch_name: &str) -> PathBuf {
        self.scratch.join(batch_name)
    }

    /// Final published location of a batch's output.
    pub fn published_output(&self, batch_name: &str) -> PathBuf {
        self.merged.join(format!("{batch_name}.mp4"))
    }

    /// Creates all four directories if missing.
    pub async fn ensure(&self) -> io::Result<()> {
        for dir in [&self.downloaded, &self.normalized, &self.merged, &self.scratch] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    /// Removes leftover scratch content from earlier runs.
    pub async fn purge_scratch(&self) -> io::Result<()> {
        if self.scratch.exists() {
            tokio::fs::remove_dir_all(&self.scratch).await?;
        }
        tokio::fs::create_dir_all(&self.scratch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout(dir: &TempDir) -> StorageLayout {
        StorageLayout::rooted_at(dir.path(), &PathsConfig::default())
    }

    #[tokio::test]
    async fn test_ensure_creates_all_directories() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);

        layout.ensure().await.unwrap();

        assert!(layout.downloaded_dir().is_dir());
        assert!(layout.normalized_dir().is_dir());
        assert!(layout.merged_dir().is_dir());
        assert!(layout.scratch_dir().is_dir());
    }

    #[tokio::test]
    async fn test_purge_scratch_clears_leftovers() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        layout.ensure().await.unwrap();

        let leftover = layout.batch_scratch("old-batch");
        tokio::fs::create_dir_all(&leftover).await.unwrap();
        tokio::fs::write(leftover.join("old-batch-noaudio.mp4"), b"stale")
            .await
            .unwrap();

        layout.purge_scratch().await.unwrap();

        assert!(layout.scratch_dir().is_dir());
        assert!(!leftover.exists());
    }

    #[test]
    fn test_batch_paths() {
        let paths = PathsConfig::default();
        let layout = StorageLayout::rooted_at(Path::new("/work"), &paths);

        assert_eq!(
            layout.batch_scratch("intro"),
            PathBuf::from("/work/temp/intro")
        );
        assert_eq!(
            layout.published_output("intro"),
            PathBuf::from("/work/merged/intro.mp4")
        );
    }
}
