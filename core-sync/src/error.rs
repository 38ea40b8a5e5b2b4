use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] BridgeError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Upload of {key} failed: {message}")]
    UploadFailed { key: String, message: String },

    #[error("Invalid object key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;
