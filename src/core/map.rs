//! Distributed Map Contract
//!
//! The outbound interface the adapter requires from its backing
//! distributed map client. Constructing the client and managing the
//! cluster connection are the caller's responsibility; the adapter only
//! consumes handles from an already-connected client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{BackendError, ConnectivityError};

/// Value held by a distributed map entry.
///
/// The backing store is untyped, so reads type-check the value instead
/// of casting it. The adapter itself only ever writes text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapValue {
    /// Textual payload.
    Text(String),
    /// Raw byte payload.
    Blob(Vec<u8>),
}

impl MapValue {
    /// Borrow the textual payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Blob(_) => None,
        }
    }

    /// Name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }
}

/// Handle to one named distributed map.
///
/// Entry visibility and TTL enforcement are the backing store's
/// responsibility. Implementations surface deadline expiry as
/// [`BackendError::Timeout`] and caller cancellation as
/// [`BackendError::Cancelled`].
#[async_trait]
pub trait DistributedMap: Send + Sync {
    /// Write an entry with a time-to-live applied atomically with the
    /// write. A `ttl` of zero means the entry never expires
    /// automatically.
    async fn put_with_ttl(
        &self,
        key: &str,
        value: MapValue,
        ttl: Duration,
    ) -> Result<(), BackendError>;

    /// Read an entry. Absent or already-expired keys yield `None`.
    async fn get(&self, key: &str) -> Result<Option<MapValue>, BackendError>;

    /// Delete an entry, reporting whether it was present. Deleting an
    /// absent key is not an error.
    async fn remove(&self, key: &str) -> Result<bool, BackendError>;
}

/// Client for a cluster of named distributed maps.
///
/// Implementations must be safe to share across concurrent operations.
#[async_trait]
pub trait MapClient: Send + Sync {
    /// Whether the client currently reports a live cluster connection.
    fn is_running(&self) -> bool;

    /// Obtain a handle to the named map.
    async fn map(&self, name: &str) -> Result<Arc<dyn DistributedMap>, ConnectivityError>;
}

impl std::fmt::Debug for dyn DistributedMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedMap").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for dyn MapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapClient").finish_non_exhaustive()
    }
}
