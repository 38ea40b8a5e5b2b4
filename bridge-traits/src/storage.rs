//! Object Store Abstractions
//!
//! Provides the narrow contract the core needs from a remote bucket:
//! listing, uploading, fetching and removing objects.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Streaming object body returned by [`ObjectStore::get_object`]
pub type ObjectBody = Box<dyn tokio::io::AsyncRead + Send + Unpin>;

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    /// Full object key (path inside the bucket)
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// Last modification time as a Unix timestamp (seconds), when known
    pub last_modified: Option<i64>,
}

impl ObjectSummary {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, timestamp: i64) -> Self {
        self.last_modified = Some(timestamp);
        self
    }

    /// Whether the key ends with `.{ext}` for any of the given extensions
    /// (case-insensitive, extensions given without the dot).
    pub fn has_extension(&self, extensions: &[String]) -> bool {
        let lower = self.key.to_lowercase();
        extensions
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext.trim_start_matches('.').to_lowercase())))
    }
}

/// Remote object store access trait
///
/// Abstracts S3-compatible buckets (R2, S3, MinIO) as well as local and
/// in-memory stand-ins.
///
/// # Contract
///
/// - Every method is fallible I/O.
/// - `list` gives no ordering guarantee; callers must not depend on
///   alphabetical or chronological order.
/// - `put_object` must not be retried silently by callers; a failure is an
///   upload failure.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::ObjectStore;
///
/// async fn count_mp3(store: &dyn ObjectStore) -> Result<usize> {
///     let objects = store.list("music", None).await?;
///     Ok(objects.iter().filter(|o| o.key.ends_with(".mp3")).count())
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List objects in a bucket, optionally restricted to a key prefix
    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<ObjectSummary>>;

    /// Store an object, replacing any existing object with the same key
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()>;

    /// Open an object for streaming reads
    ///
    /// Returns [`BridgeError::NotFound`](crate::error::BridgeError::NotFound)
    /// when the key does not exist.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody>;

    /// Remove an object
    ///
    /// Returns `Ok(false)` when the key did not exist.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<bool>;

    /// Read an object fully into memory
    async fn get_object_bytes(&self, bucket: &str, key: &str) -> Result<Bytes> {
        use tokio::io::AsyncReadExt;

        let mut body = self.get_object(bucket, key).await?;
        let mut buffer = Vec::new();
        body.read_to_end(&mut buffer).await?;
        Ok(Bytes::from(buffer))
    }
}
