//! Request-scoped scratch directories.
//!
//! Tool-backed converters stage their input and output through a uniquely
//! named directory under the system temp dir. The guard removes the
//! directory on drop, which covers every exit path: success, converter
//! failure, and dispatcher-timeout cancellation.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

/// RAII guard for a scratch directory.
pub(crate) struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh uuid-named scratch directory.
    pub(crate) async fn new(label: &str) -> Result<Self> {
        let path = std::env::temp_dir().join(format!("morph_{}_{}", label, uuid::Uuid::new_v4()));
        fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        // Best-effort cleanup - Drop can't be async, so hand it to the runtime
        let path = self.path.clone();
        tokio::spawn(async move {
            let _ = fs::remove_dir_all(&path).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scratch_dir_created_and_cleaned_up() {
        let path = {
            let scratch = ScratchDir::new("test").await.unwrap();
            assert!(scratch.path().exists());
            scratch.path().to_path_buf()
        };

        // Give the runtime time to run the cleanup task
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        assert!(!path.exists() || fs::read_dir(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_scratch_dirs_are_unique() {
        let a = ScratchDir::new("test").await.unwrap();
        let b = ScratchDir::new("test").await.unwrap();
        assert_ne!(a.path(), b.path());
    }
}
