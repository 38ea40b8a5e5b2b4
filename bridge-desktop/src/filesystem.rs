//! Object store backed by a local directory, using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{ObjectBody, ObjectStore, ObjectSummary},
};
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based local object store
///
/// Each bucket is a directory under `root`; each object key maps to a file
/// path below it, with `/` in the key creating nested directories. Content
/// types are accepted but not persisted.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at the platform data directory
    pub fn new() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("bucket-tunes")
            .join("objects");

        Self { root }
    }

    /// Create a store rooted at a custom directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        Ok(self.root.join(checked_relative(bucket)?))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        Ok(self.bucket_dir(bucket)?.join(checked_relative(key)?))
    }

    fn map_io_error(bucket: &str, key: &str, e: std::io::Error) -> BridgeError {
        if e.kind() == std::io::ErrorKind::NotFound {
            BridgeError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
        } else {
            BridgeError::Io(e)
        }
    }
}

impl Default for LocalObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject keys that would escape the bucket directory
fn checked_relative(key: &str) -> Result<&Path> {
    let path = Path::new(key);
    let escapes = key.is_empty()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));

    if escapes {
        return Err(BridgeError::OperationFailed(format!(
            "Invalid object key: {:?}",
            key
        )));
    }
    Ok(path)
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<ObjectSummary>> {
        let bucket_dir = self.bucket_dir(bucket)?;
        if !fs::try_exists(&bucket_dir).await? {
            debug!(bucket, "Bucket directory does not exist, listing is empty");
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        let mut pending = vec![bucket_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let metadata = entry.metadata().await?;

                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&bucket_dir) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                if prefix.is_some_and(|p| !key.starts_with(p)) {
                    continue;
                }

                let last_modified = metadata
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|d| d.as_secs() as i64);

                objects.push(ObjectSummary {
                    key,
                    size: metadata.len(),
                    last_modified,
                });
            }
        }

        debug!(bucket, count = objects.len(), "Listed local objects");
        Ok(objects)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let size = data.len();
        fs::write(&path, data).await?;
        debug!(bucket, key, size, content_type, "Stored local object");
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        let path = self.object_path(bucket, key)?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| Self::map_io_error(bucket, key, e))?;

        debug!(bucket, key, "Opened local object");
        Ok(Box::new(file))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<bool> {
        let path = self.object_path(bucket, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(bucket, key, "Removed local object");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_list_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::with_root(dir.path());

        store
            .put_object("music", "Alice - Song1.mp3", Bytes::from_static(b"abc"), "audio/mpeg")
            .await
            .unwrap();
        store
            .put_object("music", "playlists/Gym.json", Bytes::from_static(b"[]"), "application/json")
            .await
            .unwrap();

        let mut keys: Vec<String> = store
            .list("music", None)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["Alice - Song1.mp3", "playlists/Gym.json"]);

        let playlists = store.list("music", Some("playlists/")).await.unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].size, 2);

        let data = store.get_object_bytes("music", "Alice - Song1.mp3").await.unwrap();
        assert_eq!(&data[..], b"abc");
    }

    #[tokio::test]
    async fn test_missing_bucket_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::with_root(dir.path());

        assert!(store.list("nothing-here", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::with_root(dir.path());

        let result = store.get_object("music", "missing.mp3").await;
        assert!(matches!(result, Err(BridgeError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::with_root(dir.path());
        store
            .put_object("music", "playlists/Gym.json", Bytes::from_static(b"[]"), "application/json")
            .await
            .unwrap();

        assert!(store.delete_object("music", "playlists/Gym.json").await.unwrap());
        assert!(!store.delete_object("music", "playlists/Gym.json").await.unwrap());
        assert!(store.list("music", Some("playlists/")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::with_root(dir.path());

        let result = store
            .put_object("music", "../outside.mp3", Bytes::new(), "audio/mpeg")
            .await;
        assert!(matches!(result, Err(BridgeError::OperationFailed(_))));

        let result = store.get_object("music", "/etc/passwd").await;
        assert!(result.is_err());
    }
}
