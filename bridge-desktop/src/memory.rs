//! In-process object store

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{ObjectBody, ObjectStore, ObjectSummary},
};
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::io::Cursor;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    last_modified: i64,
    sequence: u64,
}

/// Object store kept entirely in memory
///
/// Listings are returned newest-first (reverse insertion order), so code
/// that accidentally depends on listing order shows up in tests.
#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<HashMap<String, HashMap<String, StoredObject>>>,
    sequence: RwLock<u64>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type recorded for an object, if present
    pub async fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|o| o.content_type.clone())
    }

    /// Number of objects in a bucket
    pub async fn len(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map_or(0, HashMap::len)
    }

    pub async fn is_empty(&self, bucket: &str) -> bool {
        self.len(bucket).await == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<ObjectSummary>> {
        let buckets = self.buckets.read().await;
        let Some(objects) = buckets.get(bucket) else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<(&String, &StoredObject)> = objects
            .iter()
            .filter(|(key, _)| prefix.map_or(true, |p| key.starts_with(p)))
            .collect();
        entries.sort_by(|a, b| b.1.sequence.cmp(&a.1.sequence));

        Ok(entries
            .into_iter()
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size: object.data.len() as u64,
                last_modified: Some(object.last_modified),
            })
            .collect())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(BridgeError::OperationFailed(
                "Object key cannot be empty".to_string(),
            ));
        }

        let sequence = {
            let mut counter = self.sequence.write().await;
            *counter += 1;
            *counter
        };

        debug!(bucket, key, size = data.len(), "Stored in-memory object");
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredObject {
                    data,
                    content_type: content_type.to_string(),
                    last_modified: Utc::now().timestamp(),
                    sequence,
                },
            );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        let buckets = self.buckets.read().await;
        let object = buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .ok_or_else(|| BridgeError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        Ok(Box::new(Cursor::new(object.data.clone())))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<bool> {
        let removed = self
            .buckets
            .write()
            .await
            .get_mut(bucket)
            .and_then(|objects| objects.remove(key))
            .is_some();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let store = MemoryObjectStore::new();
        for key in ["a.mp3", "b.mp3", "c.mp3"] {
            store
                .put_object("music", key, Bytes::from_static(b"x"), "audio/mpeg")
                .await
                .unwrap();
        }

        let keys: Vec<String> = store
            .list("music", None)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["c.mp3", "b.mp3", "a.mp3"]);
    }

    #[tokio::test]
    async fn test_prefix_and_content_type() {
        let store = MemoryObjectStore::new();
        store
            .put_object("music", "playlists/Gym.json", Bytes::from_static(b"[]"), "application/json")
            .await
            .unwrap();
        store
            .put_object("music", "song.mp3", Bytes::from_static(b"x"), "audio/mpeg")
            .await
            .unwrap();

        let listed = store.list("music", Some("playlists/")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "playlists/Gym.json");
        assert_eq!(
            store.content_type("music", "song.mp3").await.as_deref(),
            Some("audio/mpeg")
        );
        assert_eq!(store.len("music").await, 2);
    }

    #[tokio::test]
    async fn test_get_object_bytes_and_not_found() {
        let store = MemoryObjectStore::new();
        store
            .put_object("music", "song.mp3", Bytes::from_static(b"audio"), "audio/mpeg")
            .await
            .unwrap();

        let data = store.get_object_bytes("music", "song.mp3").await.unwrap();
        assert_eq!(&data[..], b"audio");

        let missing = store.get_object("music", "other.mp3").await;
        assert!(matches!(missing, Err(BridgeError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_object() {
        let store = MemoryObjectStore::new();
        store
            .put_object("music", "song.mp3", Bytes::from_static(b"x"), "audio/mpeg")
            .await
            .unwrap();

        assert!(store.delete_object("music", "song.mp3").await.unwrap());
        assert!(!store.delete_object("music", "song.mp3").await.unwrap());
        assert!(store.is_empty("music").await);
    }
}
