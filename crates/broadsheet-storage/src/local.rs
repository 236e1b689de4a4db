use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at `base_path` (created if missing).
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a storage key to a filesystem path under the storage root.
    ///
    /// Only plain relative components are accepted, so a key can never resolve
    /// outside `base_path`.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.starts_with('/') || key.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let relative = Path::new(key);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(self.base_path.join(relative))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    fn temp_path_for(path: &Path) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut name = path
            .file_name()
            .map(|f| f.to_os_string())
            .unwrap_or_default();
        name.push(format!(".tmp-{}-{}", std::process::id(), n));
        path.with_file_name(name)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::ReadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            )),
        })?;

        tracing::debug!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(data)
    }

    async fn write(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();
        let temp_path = Self::temp_path_for(&path);

        let written = async {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.write_all(data).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to write file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.sync_all().await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to sync file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            fs::rename(&temp_path, &path).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to move {} into place: {}",
                    path.display(),
                    e
                ))
            })
        }
        .await;

        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                tracing::debug!(
                    path = %temp_path.display(),
                    error = %cleanup,
                    "Temporary file cleanup skipped"
                );
            }
            return Err(err);
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadsheet_core::AppError;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage
            .write("images/processed/1_processed.png", b"first")
            .await
            .unwrap();
        assert!(storage.exists("images/processed/1_processed.png").await.unwrap());
        assert_eq!(
            storage.read("images/processed/1_processed.png").await.unwrap(),
            b"first"
        );

        storage
            .write("images/processed/1_processed.png", b"second")
            .await
            .unwrap();
        assert_eq!(
            storage.read("images/processed/1_processed.png").await.unwrap(),
            b"second"
        );
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage.write("out/a.png", b"data").await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["a.png".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let err = storage.read("uploads/missing.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(ref k) if k == "uploads/missing.jpg"));

        let app_err: AppError = err.into();
        assert_eq!(
            app_err.to_string(),
            "Original file not found: uploads/missing.jpg"
        );
        assert!(!storage.exists("uploads/missing.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.read("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.write("/etc/passwd", b"x").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("images/../../outside.png").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_double_dot_inside_a_name_is_allowed() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage.write("uploads/photo..jpg", b"x").await.unwrap();
        assert!(storage.exists("uploads/photo..jpg").await.unwrap());
        assert_eq!(storage.read("uploads/photo..jpg").await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_exists_surfaces_io_errors() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        storage.write("plain.txt", b"x").await.unwrap();

        // a regular file used as a directory is an I/O error, not a missing key
        let err = storage.exists("plain.txt/child.png").await.unwrap_err();
        assert!(matches!(err, StorageError::IoError(_)));

        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Storage(_)));
    }
}
