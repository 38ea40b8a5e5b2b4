use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Conflict: {entity_type} with key {key} already exists")]
    Conflict { entity_type: String, key: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LibraryError {
    pub(crate) fn not_found(entity_type: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.into(),
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error is a uniqueness violation on insert
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Map a sqlx error to `Conflict` when it is a UNIQUE/PRIMARY KEY violation
pub(crate) fn map_unique_violation(
    error: sqlx::Error,
    entity_type: &str,
    key: &str,
) -> LibraryError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            LibraryError::Conflict {
                entity_type: entity_type.to_string(),
                key: key.to_string(),
            }
        }
        _ => LibraryError::Database(error),
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
