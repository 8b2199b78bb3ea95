//! Local filesystem storage implementation.
//!
//! Each slot is a file below the storage root:
//!
//! ```text
//! {root}/
//! ├── config.toml           # Scraper configuration
//! └── latest_deaths.json    # Default snapshot slot
//! ```

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::SnapshotStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Storage root.
    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Resolve a slot name to a path below the root.
    fn path(&self, slot: &str) -> Result<PathBuf> {
        let relative = Path::new(slot);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if slot.is_empty() || escapes {
            return Err(AppError::storage(format!(
                "slot '{slot}' must be a relative path inside the storage root"
            )));
        }
        Ok(self.root_dir.join(relative))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// Sibling of `path` with `.tmp` appended to the full file name.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[async_trait]
impl SnapshotStorage for LocalStorage {
    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, slot: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(slot)?;
        self.ensure_dir(&path).await?;

        let tmp = temp_path(&path);
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    async fn read_bytes(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(slot)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    fn location(&self, slot: &str) -> String {
        self.root_dir.join(slot).display().to_string()
    }
}
