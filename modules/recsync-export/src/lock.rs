use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::ExportError;

pub const LOCK_FILE: &str = ".lock";

/// Marker file that keeps two exports from writing into the same root.
///
/// Acquisition is a single `create_new`, so two processes racing for the
/// lock cannot both win. Release is explicit (and async); callers release
/// on every exit path.
#[derive(Debug)]
pub struct ExportLock {
    path: PathBuf,
}

impl ExportLock {
    pub fn path_in(export_root: &Path) -> PathBuf {
        export_root.join(LOCK_FILE)
    }

    pub async fn is_held(export_root: &Path) -> bool {
        fs::try_exists(Self::path_in(export_root))
            .await
            .unwrap_or(false)
    }

    pub async fn acquire(export_root: &Path) -> Result<Self, ExportError> {
        let path = Self::path_in(export_root);
        if Self::is_held(export_root).await {
            return Err(ExportError::InProgress(path));
        }

        fs::create_dir_all(export_root)
            .await
            .map_err(|e| ExportError::io(export_root, e))?;

        let created = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        match created {
            Ok(_) => {
                debug!(path = %path.display(), "Export lock acquired");
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(ExportError::InProgress(path)),
            Err(e) => Err(ExportError::io(path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file. Failure is logged, never returned.
    pub async fn release(self) {
        match fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Export lock released"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to release export lock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_reports_in_progress() {
        let dir = tempfile::tempdir().unwrap();
        let lock = ExportLock::acquire(dir.path()).await.unwrap();
        assert!(ExportLock::is_held(dir.path()).await);

        let err = ExportLock::acquire(dir.path()).await.unwrap_err();
        assert!(matches!(err, ExportError::InProgress(ref p) if p == lock.path()));

        lock.release().await;
        assert!(!ExportLock::is_held(dir.path()).await);
        ExportLock::acquire(dir.path()).await.unwrap().release().await;
    }

    #[tokio::test]
    async fn acquire_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("var/export");
        let lock = ExportLock::acquire(&root).await.unwrap();
        assert!(root.join(LOCK_FILE).exists());
        lock.release().await;
    }
}
