//! Service-level errors and their client-facing taxonomy

use bridge_traits::BridgeError;
use core_library::LibraryError;
use core_sync::SyncError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Object store error: {0}")]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Stable error code reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A referenced playlist, track or object does not exist
    NotFound,
    /// Duplicate key outside a sync context
    Conflict,
    /// Missing or malformed input, rejected before any I/O
    Validation,
    /// Object store or catalog database unavailable
    Upstream,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Validation => "VALIDATION",
            Self::Upstream => "UPSTREAM",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Validation => 400,
            Self::Upstream => 502,
            Self::Internal => 500,
        }
    }

    /// Server-side failures never expose their details
    pub fn is_server_error(&self) -> bool {
        self.http_status() >= 500
    }

    fn generic_message(&self) -> &'static str {
        match self {
            Self::Upstream => "Storage backend unavailable",
            _ => "Internal server error",
        }
    }
}

/// Body returned to clients for a failed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Library(e) | Self::Sync(SyncError::Library(e)) => library_code(e),
            Self::Bridge(e) | Self::Sync(SyncError::ObjectStore(e)) => bridge_code(e),
            Self::Sync(SyncError::UploadFailed { .. }) => ErrorCode::Upstream,
            Self::Sync(SyncError::InvalidKey { .. }) => ErrorCode::Validation,
            Self::Runtime(_) | Self::InitializationFailed(_) => ErrorCode::Internal,
        }
    }

    /// Convert into the client-facing response
    ///
    /// Server-side errors are logged here in full and replaced by a fixed
    /// message.
    pub fn to_response(&self) -> ErrorResponse {
        let code = self.code();
        if code.is_server_error() {
            error!(code = code.as_str(), error = %self, "Request failed");
            return ErrorResponse {
                code,
                message: code.generic_message().to_string(),
            };
        }

        ErrorResponse {
            code,
            message: self.client_message(),
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Library(e) | Self::Sync(SyncError::Library(e)) => e.to_string(),
            Self::Bridge(e) | Self::Sync(SyncError::ObjectStore(e)) => e.to_string(),
            Self::Sync(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

fn library_code(error: &LibraryError) -> ErrorCode {
    match error {
        LibraryError::NotFound { .. } => ErrorCode::NotFound,
        LibraryError::Conflict { .. } => ErrorCode::Conflict,
        LibraryError::InvalidInput { .. } => ErrorCode::Validation,
        LibraryError::Database(_) => ErrorCode::Upstream,
        LibraryError::Bridge(e) => bridge_code(e),
        LibraryError::Migration(_) | LibraryError::Serialization(_) => ErrorCode::Internal,
    }
}

fn bridge_code(error: &BridgeError) -> ErrorCode {
    match error {
        BridgeError::NotFound { .. } => ErrorCode::NotFound,
        BridgeError::NotAvailable(_) | BridgeError::OperationFailed(_) | BridgeError::Io(_) => {
            ErrorCode::Upstream
        }
    }
}
