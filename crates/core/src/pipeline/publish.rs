//! Output promotion.

use std::path::Path;
use tokio::fs;

/// Moves a finished output from scratch to its published location.
///
/// Rename is atomic on the same filesystem; replacing an existing
/// output either fully succeeds or leaves the old file in place.
/// Cross-filesystem moves fall back to copy plus delete.
pub async fn publish_file(source: &Path, destination: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(e) => {
            // Cross-filesystem moves fail with EXDEV (18 on Linux)
            if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                fs::copy(source, destination).await?;
                fs::remove_file(source).await?;
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_publish_moves_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("staged.mp4");
        let destination = dir.path().join("merged").join("final.mp4");
        fs::write(&source, b"output bytes").await.unwrap();

        publish_file(&source, &destination).await.unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&destination).await.unwrap(), b"output bytes");
    }

    #[tokio::test]
    async fn test_publish_overwrites_existing_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("staged.mp4");
        let destination = dir.path().join("final.mp4");
        fs::write(&source, b"new").await.unwrap();
        fs::write(&destination, b"old").await.unwrap();

        publish_file(&source, &destination).await.unwrap();

        assert_eq!(fs::read(&destination).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_publish_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let result = publish_file(
            &dir.path().join("missing.mp4"),
            &dir.path().join("final.mp4"),
        )
        .await;
        assert!(result.is_err());
    }
}
