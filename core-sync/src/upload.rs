//! Upload path: store a file in the bucket, then catalog it
//!
//! Only media file names are accepted, and nothing may be written under the
//! playlist document prefix.
//!
//! A failed `put_object` aborts with [`SyncError::UploadFailed`] and is not
//! retried; files stored before the failure stay stored and catalogued.

use std::sync::Arc;

use bridge_traits::storage::{ObjectStore, ObjectSummary};
use bytes::Bytes;
use core_library::repositories::PLAYLIST_PREFIX;
use tracing::{info, instrument, warn};

use crate::ingest::{IngestOutcome, TrackIngestor};
use crate::{Result, SyncError};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for a file name, from its extension
pub fn content_type_for(file_name: &str) -> &'static str {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return FALLBACK_CONTENT_TYPE;
    };

    match ext.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "wav" => "audio/wav",
        "webm" => "audio/webm",
        "json" => "application/json",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

/// One file handed to [`TrackUploader::upload`]
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original file name; becomes the object key
    pub file_name: String,
    /// Supplied content type, inferred from the name when absent
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    fn resolved_content_type(&self) -> &str {
        match self.content_type.as_deref() {
            Some(ct) if !ct.trim().is_empty() => ct,
            _ => content_type_for(&self.file_name),
        }
    }
}

/// Stores uploaded files and ingests them through the shared routine
pub struct TrackUploader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    ingestor: Arc<TrackIngestor>,
    media_extensions: Vec<String>,
}

impl TrackUploader {
    /// `media_extensions` lists the accepted extensions, without the dot
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        ingestor: Arc<TrackIngestor>,
        media_extensions: Vec<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            ingestor,
            media_extensions,
        }
    }

    /// Store every file, then ensure a catalog entry for each, in order
    ///
    /// All names are validated before anything is written.
    #[instrument(skip(self, files), fields(bucket = %self.bucket, files = files.len()))]
    pub async fn upload(&self, files: &[UploadFile]) -> Result<Vec<IngestOutcome>> {
        for file in files {
            self.check_name(&file.file_name)?;
        }

        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            let key = file.file_name.as_str();
            let content_type = file.resolved_content_type();

            self.store
                .put_object(&self.bucket, key, file.data.clone(), content_type)
                .await
                .map_err(|e| {
                    warn!(key, error = %e, "Upload failed");
                    SyncError::UploadFailed {
                        key: key.to_string(),
                        message: e.to_string(),
                    }
                })?;

            let summary = ObjectSummary::new(key, file.data.len() as u64);
            outcomes.push(self.ingestor.ensure_track(&summary).await?);
        }

        info!(
            created = outcomes.iter().filter(|o| o.is_created()).count(),
            "Upload completed"
        );
        Ok(outcomes)
    }

    fn check_name(&self, file_name: &str) -> Result<()> {
        let invalid = |reason: &str| -> Result<()> {
            Err(SyncError::InvalidKey {
                key: file_name.to_string(),
                reason: reason.to_string(),
            })
        };

        if file_name.trim().is_empty() {
            return invalid("file name cannot be empty");
        }
        if file_name.starts_with(PLAYLIST_PREFIX) {
            return invalid("key is reserved for playlist documents");
        }
        if !ObjectSummary::new(file_name, 0).has_extension(&self.media_extensions) {
            return invalid("not a recognized media file");
        }
        Ok(())
    }
}
