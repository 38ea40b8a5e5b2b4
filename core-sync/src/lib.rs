//! # Sync & Ingest Module
//!
//! Reconciles an object-store bucket into the track catalog.
//!
//! ## Overview
//!
//! This module manages:
//! - Listing the bucket via `ObjectStore` and filtering media keys
//! - Deriving title and artist from each key
//! - Creating catalog entries exactly once per key, even under concurrent runs
//! - Storing uploaded files and cataloguing them through the same routine
//!
//! ## Components
//!
//! - **Track Ingestor** (`ingest`): Produce-or-reuse a catalog entry for one key
//! - **Sync Coordinator** (`coordinator`): Full-listing reconciliation and single-key registration
//! - **Track Uploader** (`upload`): Store files in the bucket, then ingest them

pub mod coordinator;
pub mod error;
pub mod ingest;
pub mod upload;

pub use coordinator::{SyncConfig, SyncCoordinator, SyncReport};
pub use error::{Result, SyncError};
pub use ingest::{IngestOutcome, TrackIngestor};
pub use upload::{content_type_for, TrackUploader, UploadFile};
