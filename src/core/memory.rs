//! In-Memory Map Client
//!
//! TTL-capable reference backend for tests and local development.
//! Production deployments supply their own [`MapClient`] over the real
//! cluster.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::core::map::{DistributedMap, MapClient, MapValue};
use crate::error::{BackendError, ConnectivityError};

/// In-memory, TTL-capable map client.
///
/// Maps are created on first resolution. Expired entries are dropped
/// lazily on access; deadlines run on the tokio clock, so paused-clock
/// tests can drive expiry deterministically.
pub struct InMemoryMapClient {
    maps: Mutex<HashMap<String, Arc<InMemoryMap>>>,
    running: AtomicBool,
}

impl InMemoryMapClient {
    /// Create a connected client with no maps.
    pub fn new() -> Self {
        Self {
            maps: Mutex::new(HashMap::new()),
            running: AtomicBool::new(true),
        }
    }

    /// Drop the simulated cluster connection.
    ///
    /// After shutdown the client reports itself as not running and
    /// refuses to resolve map handles.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Default for InMemoryMapClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MapClient for InMemoryMapClient {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn map(&self, name: &str) -> Result<Arc<dyn DistributedMap>, ConnectivityError> {
        if !self.is_running() {
            return Err(ConnectivityError::MapUnavailable {
                name: name.to_string(),
                message: "client is shut down".to_string(),
            });
        }

        let mut maps = self.maps.lock().unwrap();
        let map = maps
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InMemoryMap::default()))
            .clone();
        Ok(map)
    }
}

#[derive(Default)]
struct InMemoryMap {
    entries: Mutex<HashMap<String, Entry>>,
}

struct Entry {
    value: MapValue,
    deadline: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        self.deadline.map(|deadline| deadline <= now).unwrap_or(false)
    }
}

#[async_trait]
impl DistributedMap for InMemoryMap {
    async fn put_with_ttl(
        &self,
        key: &str,
        value: MapValue,
        ttl: Duration,
    ) -> Result<(), BackendError> {
        let deadline = (ttl > Duration::ZERO).then(|| Instant::now() + ttl);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), Entry { value, deadline });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<MapValue>, BackendError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();

        let expired = matches!(entries.get(key), Some(entry) if entry.expired(now));
        if expired {
            entries.remove(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn remove(&self, key: &str) -> Result<bool, BackendError> {
        let now = Instant::now();
        let removed = self.entries.lock().unwrap().remove(key);
        Ok(removed.map(|entry| !entry.expired(now)).unwrap_or(false))
    }
}
