//! # Sync Coordinator
//!
//! One-way, insert-only reconciliation of a bucket listing into the catalog.
//!
//! ## Workflow
//!
//! 1. List the bucket through the `ObjectStore` (one immediate retry)
//! 2. Filter to recognized media extensions
//! 3. Ingest each remaining key in listing order
//! 4. Report how many entries were added, already present or ignored
//!
//! Sync never deletes or updates catalog entries. Running it twice over the
//! same listing adds nothing the second time, and concurrent runs are safe
//! because ingest tolerates lost insert races.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncConfig, SyncCoordinator};
//!
//! let coordinator = SyncCoordinator::new(store, "music", ingestor, SyncConfig::default());
//! let report = coordinator.sync().await?;
//! println!("added {}", report.added_count);
//! ```

use std::sync::Arc;

use bridge_traits::storage::{ObjectStore, ObjectSummary};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::ingest::{IngestOutcome, TrackIngestor};
use crate::{Result, SyncError};

/// Sync coordinator configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Object key extensions treated as audio, without the dot
    pub media_extensions: Vec<String>,

    /// Immediate retries of a failed bucket listing
    pub listing_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            media_extensions: vec!["mp3".to_string()],
            listing_retries: 1,
        }
    }
}

/// Outcome counts of one sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// New catalog entries created
    pub added_count: usize,
    /// Media keys that were already catalogued
    pub existing_count: usize,
    /// Keys skipped for not having a media extension
    pub ignored_count: usize,
    /// Inserts that lost a race to a concurrent writer
    pub conflicts_recovered: usize,
}

impl SyncReport {
    fn record(&mut self, outcome: &IngestOutcome) {
        match outcome {
            IngestOutcome::Created(_) => self.added_count += 1,
            IngestOutcome::Existing {
                recovered_conflict, ..
            } => {
                self.existing_count += 1;
                if *recovered_conflict {
                    self.conflicts_recovered += 1;
                }
            }
        }
    }
}

/// Sync coordinator for reconciling a bucket into the catalog
pub struct SyncCoordinator {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    ingestor: Arc<TrackIngestor>,
    config: SyncConfig,
}

impl SyncCoordinator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        ingestor: Arc<TrackIngestor>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            ingestor,
            config,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn ingestor(&self) -> &Arc<TrackIngestor> {
        &self.ingestor
    }

    /// List the bucket and reconcile every media object into the catalog
    ///
    /// # Errors
    ///
    /// Returns `SyncError::ObjectStore` if the listing fails after its
    /// retry, or the first catalog error hit while ingesting.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn sync(&self) -> Result<SyncReport> {
        info!("Listing bucket");
        let listing = self.list_with_retry().await?;
        info!(objects = listing.len(), "Discovered objects");

        let report = self.sync_listing(&listing).await?;
        info!(
            added = report.added_count,
            existing = report.existing_count,
            ignored = report.ignored_count,
            conflicts_recovered = report.conflicts_recovered,
            "Sync completed"
        );
        Ok(report)
    }

    /// Reconcile an already-fetched listing, in listing order
    pub async fn sync_listing(&self, listing: &[ObjectSummary]) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        for object in listing {
            if !object.has_extension(&self.config.media_extensions) {
                debug!(key = %object.key, "Skipping non-media object");
                report.ignored_count += 1;
                continue;
            }

            let outcome = self.ingestor.ensure_track(object).await?;
            report.record(&outcome);
        }

        Ok(report)
    }

    /// Catalog a single object that is known to exist in the bucket
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidKey` for an empty key or one without a
    /// media extension, and `SyncError::ObjectStore` with
    /// `BridgeError::NotFound` when the bucket has no such object.
    #[instrument(skip(self))]
    pub async fn register_key(&self, key: &str) -> Result<IngestOutcome> {
        if key.trim().is_empty() {
            return Err(SyncError::InvalidKey {
                key: key.to_string(),
                reason: "key cannot be empty".to_string(),
            });
        }

        let object = self
            .store
            .list(&self.bucket, Some(key))
            .await?
            .into_iter()
            .find(|o| o.key == key)
            .ok_or_else(|| bridge_traits::BridgeError::NotFound {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            })?;

        if !object.has_extension(&self.config.media_extensions) {
            return Err(SyncError::InvalidKey {
                key: key.to_string(),
                reason: "not a recognized media file".to_string(),
            });
        }

        self.ingestor.ensure_track(&object).await
    }

    async fn list_with_retry(&self) -> Result<Vec<ObjectSummary>> {
        let mut attempt = 0;
        loop {
            match self.store.list(&self.bucket, None).await {
                Ok(listing) => return Ok(listing),
                Err(e) if attempt < self.config.listing_retries => {
                    attempt += 1;
                    warn!(error = %e, attempt, "Bucket listing failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
