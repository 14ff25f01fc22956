//! Token Store Error Types
//!
//! Error hierarchy for the map-backed token store.

use thiserror::Error;

use crate::types::TokenCategory;

/// Root error type for token store operations.
#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Connectivity error: {0}")]
    Connectivity(#[from] ConnectivityError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Decoding error: {0}")]
    Decoding(#[from] DecodingError),

    #[error("No {category} entry for key: {key}")]
    NotFound {
        category: TokenCategory,
        key: String,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl TokenStoreError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "TOKEN_STORE_CONFIG",
            Self::Connectivity(_) => "TOKEN_STORE_CONNECTIVITY",
            Self::Encoding(_) => "TOKEN_STORE_ENCODE",
            Self::Decoding(_) => "TOKEN_STORE_DECODE",
            Self::NotFound { .. } => "TOKEN_STORE_NOT_FOUND",
            Self::Backend(_) => "TOKEN_STORE_BACKEND",
        }
    }

    /// Check for the uniform absent-or-expired outcome.
    ///
    /// Expired entries are indistinguishable from entries that were
    /// never written, since expiry is enforced by the backing store.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Construction-time configuration error. Fatal: no store is created.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Map client does not report a live connection")]
    ClientNotConnected,

    #[error("Invalid {category} map name: must not be empty")]
    EmptyMapName { category: TokenCategory },
}

/// Map handle resolution failure.
#[derive(Error, Debug)]
pub enum ConnectivityError {
    #[error("Map {name} is unavailable: {message}")]
    MapUnavailable { name: String, message: String },
}

/// Record serialization error.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Cannot encode record: {message}")]
    Serialize { message: String },

    #[error("Record sets a {category} token without an expiry duration")]
    MissingExpiry { category: TokenCategory },
}

/// Stored value deserialization error.
///
/// Distinct from [`TokenStoreError::NotFound`] so callers can tell
/// corrupt data from a key that was never written.
#[derive(Error, Debug)]
pub enum DecodingError {
    #[error("Stored value is not a valid record: {message}")]
    Malformed { message: String },

    #[error("Stored value has unexpected type: expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
}

/// Generic backing store failure on get/put/remove.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Operation timed out")]
    Timeout,

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Backend failure: {message}")]
    Internal { message: String },
}

/// Result type for token store operations.
pub type StoreResult<T> = Result<T, TokenStoreError>;
