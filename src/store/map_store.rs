//! Map-Backed Token Store
//!
//! Adapter between the framework storage contract and a distributed,
//! TTL-capable map client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::builders::StoreConfig;
use crate::core::buffer::BufferPool;
use crate::core::map::{DistributedMap, MapClient, MapValue};
use crate::error::{
    ConfigurationError, DecodingError, EncodingError, StoreResult, TokenStoreError,
};
use crate::store::TokenStore;
use crate::types::{TokenCategory, TokenRecord};

/// Token store backed by per-category distributed maps.
///
/// One record fans out to up to three entries, one per populated
/// category, each under its own namespaced key and TTL. The fan-out is
/// a sequence of independent writes, not a transaction: the backing
/// store offers no cross-map atomicity, so the first failed write
/// aborts the remaining ones and already-committed entries stay
/// readable. Callers own any retry or compensation policy.
#[derive(Debug)]
pub struct MapTokenStore {
    client: Arc<dyn MapClient>,
    config: StoreConfig,
    buffers: BufferPool,
}

impl MapTokenStore {
    /// Create a store over an already-connected map client.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigurationError::ClientNotConnected`] when the
    /// client does not report a live connection. No store is created.
    pub fn new(client: Arc<dyn MapClient>, config: StoreConfig) -> StoreResult<Self> {
        if !client.is_running() {
            return Err(ConfigurationError::ClientNotConnected.into());
        }

        let buffers = BufferPool::new(config.buffer_pool_size);
        Ok(Self {
            client,
            config,
            buffers,
        })
    }

    /// Create a store with the default configuration.
    pub fn with_defaults(client: Arc<dyn MapClient>) -> StoreResult<Self> {
        Self::new(client, StoreConfig::default())
    }

    async fn map_for(&self, category: TokenCategory) -> StoreResult<Arc<dyn DistributedMap>> {
        let name = self.config.map_name(category);
        Ok(self.client.map(name).await?)
    }

    /// Serialize a record through a pooled buffer.
    ///
    /// The buffer returns to the pool on every exit path; on failure
    /// the error propagates and no write is attempted.
    fn encode_record(&self, record: &TokenRecord) -> StoreResult<String> {
        let mut buf = self.buffers.acquire();
        serde_json::to_writer(&mut *buf, record).map_err(|err| EncodingError::Serialize {
            message: err.to_string(),
        })?;

        let text = std::str::from_utf8(buf.as_slice()).map_err(|err| EncodingError::Serialize {
            message: err.to_string(),
        })?;
        Ok(text.to_string())
    }

    async fn put_entry(
        &self,
        category: TokenCategory,
        raw: &str,
        ttl: Duration,
        encoded: &str,
    ) -> StoreResult<()> {
        let map = self.map_for(category).await?;
        let key = category.namespaced_key(raw);
        map.put_with_ttl(&key, MapValue::Text(encoded.to_string()), ttl)
            .await?;
        debug!(%category, ttl_secs = ttl.as_secs(), "stored token entry");
        Ok(())
    }

    async fn get_entry(&self, category: TokenCategory, raw: &str) -> StoreResult<TokenRecord> {
        let map = self.map_for(category).await?;
        let key = category.namespaced_key(raw);
        let value = map
            .get(&key)
            .await?
            .ok_or_else(|| TokenStoreError::NotFound {
                category,
                key: key.clone(),
            })?;
        decode_value(value)
    }

    async fn remove_entry(&self, category: TokenCategory, raw: &str) -> StoreResult<()> {
        let map = self.map_for(category).await?;
        let key = category.namespaced_key(raw);
        let removed = map.remove(&key).await?;
        debug!(%category, removed, "removed token entry");
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MapTokenStore {
    #[instrument(skip(self, record), fields(client_id = %record.client_id))]
    async fn create(&self, record: &TokenRecord) -> StoreResult<()> {
        // Validate every populated category up front so a malformed
        // record never commits a partial write.
        let mut writes: Vec<(TokenCategory, &str, Duration)> = Vec::new();
        for category in TokenCategory::ALL {
            if let Some(id) = record.identifier(category) {
                let ttl = record
                    .expires_in(category)
                    .ok_or(EncodingError::MissingExpiry { category })?;
                writes.push((category, id, ttl));
            }
        }
        if writes.is_empty() {
            return Ok(());
        }

        let encoded = self.encode_record(record)?;

        let mut committed: Vec<TokenCategory> = Vec::new();
        for (category, id, ttl) in writes {
            if let Err(err) = self.put_entry(category, id, ttl, &encoded).await {
                if !committed.is_empty() {
                    warn!(
                        %category,
                        committed = ?committed,
                        "create aborted mid-write; committed entries remain until expiry"
                    );
                }
                return Err(err);
            }
            committed.push(category);
        }
        Ok(())
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<TokenRecord> {
        self.get_entry(TokenCategory::Code, code).await
    }

    async fn get_by_access(&self, access: &str) -> StoreResult<TokenRecord> {
        self.get_entry(TokenCategory::Access, access).await
    }

    async fn get_by_refresh(&self, refresh: &str) -> StoreResult<TokenRecord> {
        self.get_entry(TokenCategory::Refresh, refresh).await
    }

    async fn remove_by_code(&self, code: &str) -> StoreResult<()> {
        self.remove_entry(TokenCategory::Code, code).await
    }

    async fn remove_by_access(&self, access: &str) -> StoreResult<()> {
        self.remove_entry(TokenCategory::Access, access).await
    }

    async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()> {
        self.remove_entry(TokenCategory::Refresh, refresh).await
    }
}

fn decode_value(value: MapValue) -> StoreResult<TokenRecord> {
    let text = match &value {
        MapValue::Text(text) => text,
        other => {
            return Err(DecodingError::UnexpectedType {
                expected: "text",
                found: other.type_name(),
            }
            .into())
        }
    };

    serde_json::from_str(text).map_err(|err| {
        DecodingError::Malformed {
            message: err.to_string(),
        }
        .into()
    })
}

/// Create a map-backed token store with the default configuration.
pub fn map_token_store(client: Arc<dyn MapClient>) -> StoreResult<MapTokenStore> {
    MapTokenStore::with_defaults(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::Mutex;

    use mockall::mock;

    use crate::builders::store_config;
    use crate::core::memory::InMemoryMapClient;
    use crate::error::{BackendError, ConnectivityError};

    mock! {
        Map {}

        #[async_trait]
        impl DistributedMap for Map {
            async fn put_with_ttl(
                &self,
                key: &str,
                value: MapValue,
                ttl: Duration,
            ) -> Result<(), BackendError>;
            async fn get(&self, key: &str) -> Result<Option<MapValue>, BackendError>;
            async fn remove(&self, key: &str) -> Result<bool, BackendError>;
        }
    }

    mock! {
        Client {}

        #[async_trait]
        impl MapClient for Client {
            fn is_running(&self) -> bool;
            async fn map(&self, name: &str) -> Result<Arc<dyn DistributedMap>, ConnectivityError>;
        }
    }

    /// Client that resolves real in-memory maps but injects put
    /// failures on selected map names.
    struct FlakyMapClient {
        inner: InMemoryMapClient,
        failing: Mutex<HashSet<String>>,
    }

    impl FlakyMapClient {
        fn new() -> Self {
            Self {
                inner: InMemoryMapClient::new(),
                failing: Mutex::new(HashSet::new()),
            }
        }

        fn fail_puts_on(&self, name: &str) {
            self.failing.lock().unwrap().insert(name.to_string());
        }
    }

    #[async_trait]
    impl MapClient for FlakyMapClient {
        fn is_running(&self) -> bool {
            self.inner.is_running()
        }

        async fn map(&self, name: &str) -> Result<Arc<dyn DistributedMap>, ConnectivityError> {
            let handle = self.inner.map(name).await?;
            if self.failing.lock().unwrap().contains(name) {
                Ok(Arc::new(PutFailingMap { inner: handle }))
            } else {
                Ok(handle)
            }
        }
    }

    struct PutFailingMap {
        inner: Arc<dyn DistributedMap>,
    }

    #[async_trait]
    impl DistributedMap for PutFailingMap {
        async fn put_with_ttl(
            &self,
            _key: &str,
            _value: MapValue,
            _ttl: Duration,
        ) -> Result<(), BackendError> {
            Err(BackendError::Internal {
                message: "injected put failure".to_string(),
            })
        }

        async fn get(&self, key: &str) -> Result<Option<MapValue>, BackendError> {
            self.inner.get(key).await
        }

        async fn remove(&self, key: &str) -> Result<bool, BackendError> {
            self.inner.remove(key).await
        }
    }

    fn memory_store() -> MapTokenStore {
        MapTokenStore::with_defaults(Arc::new(InMemoryMapClient::new())).unwrap()
    }

    fn test_record() -> TokenRecord {
        TokenRecord {
            client_id: "client-1".to_string(),
            user_id: "user-1".to_string(),
            scope: "openid profile".to_string(),
            ..TokenRecord::default()
        }
    }

    #[tokio::test]
    async fn test_access_token_lifecycle() {
        let store = memory_store();

        let record = TokenRecord {
            access: Some("a1".to_string()),
            access_expires_in: Some(Duration::from_secs(300)),
            ..test_record()
        };
        store.create(&record).await.unwrap();

        let found = store.get_by_access("a1").await.unwrap();
        assert_eq!(found.access.as_deref(), Some("a1"));
        assert_eq!(found.client_id, "client-1");

        store.remove_by_access("a1").await.unwrap();

        let err = store.get_by_access("a1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_refresh_token_lifecycle() {
        let store = memory_store();

        let record = TokenRecord {
            refresh: Some("r1".to_string()),
            refresh_expires_in: Some(Duration::from_secs(3600)),
            ..test_record()
        };
        store.create(&record).await.unwrap();

        let found = store.get_by_refresh("r1").await.unwrap();
        assert_eq!(found.refresh.as_deref(), Some("r1"));

        store.remove_by_refresh("r1").await.unwrap();

        let err = store.get_by_refresh("r1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_authorization_code_lifecycle() {
        let store = memory_store();

        let record = TokenRecord {
            code: Some("c1".to_string()),
            code_expires_in: Some(Duration::from_secs(30)),
            code_challenge: Some("challenge".to_string()),
            ..test_record()
        };
        store.create(&record).await.unwrap();

        let found = store.get_by_code("c1").await.unwrap();
        assert_eq!(found.code.as_deref(), Some("c1"));
        assert_eq!(found.code_challenge.as_deref(), Some("challenge"));

        store.remove_by_code("c1").await.unwrap();

        let err = store.get_by_code("c1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent_for_never_written_tokens() {
        let store = memory_store();

        store.remove_by_access("ghost").await.unwrap();
        store.remove_by_refresh("ghost").await.unwrap();
        store.remove_by_code("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn test_get_absent_token_reports_category_and_key() {
        let store = memory_store();

        let err = store.get_by_refresh("missing").await.unwrap_err();
        match err {
            TokenStoreError::NotFound { category, key } => {
                assert_eq!(category, TokenCategory::Refresh);
                assert_eq!(key, "refresh:missing");
            }
            other => panic!("expected NotFound, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_same_raw_token_in_two_categories_is_independent() {
        let store = memory_store();

        let record = TokenRecord {
            access: Some("x".to_string()),
            access_expires_in: Some(Duration::from_secs(300)),
            code: Some("x".to_string()),
            code_expires_in: Some(Duration::from_secs(30)),
            ..test_record()
        };
        store.create(&record).await.unwrap();

        assert!(store.get_by_access("x").await.is_ok());
        assert!(store.get_by_code("x").await.is_ok());

        // Removing one category must not touch the other.
        store.remove_by_access("x").await.unwrap();
        assert!(store.get_by_access("x").await.unwrap_err().is_not_found());
        assert!(store.get_by_code("x").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_per_category_ttl() {
        let store = memory_store();

        let record = TokenRecord {
            code: Some("c1".to_string()),
            code_expires_in: Some(Duration::from_secs(3)),
            access: Some("a2".to_string()),
            access_expires_in: Some(Duration::from_secs(6)),
            ..test_record()
        };
        store.create(&record).await.unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(store.get_by_code("c1").await.unwrap_err().is_not_found());
        assert!(store.get_by_access("a2").await.is_ok());

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(store.get_by_access("a2").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_without_identifiers_touches_no_map() {
        let mut client = MockClient::new();
        client.expect_is_running().return_const(true);
        client.expect_map().times(0);

        let store = MapTokenStore::with_defaults(Arc::new(client)).unwrap();
        store.create(&test_record()).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_expiry_fails_before_any_write() {
        let mut client = MockClient::new();
        client.expect_is_running().return_const(true);
        client.expect_map().times(0);

        let store = MapTokenStore::with_defaults(Arc::new(client)).unwrap();

        let record = TokenRecord {
            access: Some("a1".to_string()),
            access_expires_in: Some(Duration::from_secs(300)),
            refresh: Some("r1".to_string()),
            ..test_record()
        };
        let err = store.create(&record).await.unwrap_err();
        assert!(matches!(
            err,
            TokenStoreError::Encoding(EncodingError::MissingExpiry {
                category: TokenCategory::Refresh
            })
        ));
    }

    #[tokio::test]
    async fn test_construction_rejects_disconnected_client() {
        let client = Arc::new(InMemoryMapClient::new());
        client.shutdown();

        let err = MapTokenStore::with_defaults(client).unwrap_err();
        assert!(matches!(
            err,
            TokenStoreError::Configuration(ConfigurationError::ClientNotConnected)
        ));
    }

    #[tokio::test]
    async fn test_custom_map_names_are_used() {
        let client = Arc::new(InMemoryMapClient::new());
        let config = store_config()
            .access_map_name("access_tokens")
            .refresh_map_name("refresh_tokens")
            .code_map_name("codes")
            .build()
            .unwrap();
        let store = MapTokenStore::new(client.clone(), config).unwrap();

        let record = TokenRecord {
            access: Some("a1".to_string()),
            access_expires_in: Some(Duration::from_secs(300)),
            ..test_record()
        };
        store.create(&record).await.unwrap();

        let custom = client.map("access_tokens").await.unwrap();
        assert!(custom.get("access:a1").await.unwrap().is_some());

        let default = client.map("oauth2_access_tokens").await.unwrap();
        assert!(default.get("access:a1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_write_leaves_committed_entries_readable() {
        let client = Arc::new(FlakyMapClient::new());
        client.fail_puts_on("oauth2_refresh_tokens");

        let store = MapTokenStore::with_defaults(client).unwrap();

        let record = TokenRecord {
            access: Some("a1".to_string()),
            access_expires_in: Some(Duration::from_secs(300)),
            refresh: Some("r1".to_string()),
            refresh_expires_in: Some(Duration::from_secs(3600)),
            code: Some("c1".to_string()),
            code_expires_in: Some(Duration::from_secs(30)),
            ..test_record()
        };
        let err = store.create(&record).await.unwrap_err();
        assert!(matches!(err, TokenStoreError::Backend(_)));

        // The access write committed before the failure and stays
        // readable; the refresh write failed; the code write was
        // skipped entirely.
        assert!(store.get_by_access("a1").await.is_ok());
        assert!(store.get_by_refresh("r1").await.unwrap_err().is_not_found());
        assert!(store.get_by_code("c1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_short_circuits_after_first_failed_write() {
        let mut access_map = MockMap::new();
        access_map
            .expect_put_with_ttl()
            .times(1)
            .withf(|key, _value, ttl| key == "access:a1" && *ttl == Duration::from_secs(300))
            .returning(|_, _, _| Ok(()));

        let mut refresh_map = MockMap::new();
        refresh_map
            .expect_put_with_ttl()
            .times(1)
            .returning(|_, _, _| {
                Err(BackendError::Internal {
                    message: "partition lost".to_string(),
                })
            });

        let access_map = Arc::new(access_map);
        let refresh_map = Arc::new(refresh_map);

        let mut client = MockClient::new();
        client.expect_is_running().return_const(true);
        client
            .expect_map()
            .withf(|name| name == "oauth2_access_tokens")
            .times(1)
            .returning(move |_| {
                let map: Arc<dyn DistributedMap> = access_map.clone();
                Ok(map)
            });
        client
            .expect_map()
            .withf(|name| name == "oauth2_refresh_tokens")
            .times(1)
            .returning(move |_| {
                let map: Arc<dyn DistributedMap> = refresh_map.clone();
                Ok(map)
            });
        client
            .expect_map()
            .withf(|name| name == "oauth2_codes")
            .times(0);

        let store = MapTokenStore::with_defaults(Arc::new(client)).unwrap();

        let record = TokenRecord {
            access: Some("a1".to_string()),
            access_expires_in: Some(Duration::from_secs(300)),
            refresh: Some("r1".to_string()),
            refresh_expires_in: Some(Duration::from_secs(3600)),
            code: Some("c1".to_string()),
            code_expires_in: Some(Duration::from_secs(30)),
            ..test_record()
        };
        let err = store.create(&record).await.unwrap_err();
        assert!(matches!(err, TokenStoreError::Backend(_)));
    }

    #[tokio::test]
    async fn test_unresolvable_map_surfaces_connectivity_error() {
        let mut client = MockClient::new();
        client.expect_is_running().return_const(true);
        client.expect_map().returning(|name| {
            Err(ConnectivityError::MapUnavailable {
                name: name.to_string(),
                message: "no cluster members".to_string(),
            })
        });

        let store = MapTokenStore::with_defaults(Arc::new(client)).unwrap();

        let err = store.get_by_access("a1").await.unwrap_err();
        assert!(matches!(err, TokenStoreError::Connectivity(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_is_not_folded_into_not_found() {
        let mut failing_map = MockMap::new();
        failing_map
            .expect_get()
            .times(1)
            .returning(|_| Err(BackendError::Timeout));

        let failing_map = Arc::new(failing_map);
        let mut client = MockClient::new();
        client.expect_is_running().return_const(true);
        client.expect_map().returning(move |_| {
            let map: Arc<dyn DistributedMap> = failing_map.clone();
            Ok(map)
        });

        let store = MapTokenStore::with_defaults(Arc::new(client)).unwrap();

        let err = store.get_by_access("a1").await.unwrap_err();
        assert!(matches!(
            err,
            TokenStoreError::Backend(BackendError::Timeout)
        ));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_wrong_stored_type_is_a_decoding_error() {
        let client = Arc::new(InMemoryMapClient::new());
        let store = MapTokenStore::with_defaults(client.clone()).unwrap();

        let map = client.map("oauth2_access_tokens").await.unwrap();
        map.put_with_ttl("access:bad", MapValue::Blob(vec![0x1f, 0x8b]), Duration::ZERO)
            .await
            .unwrap();

        let err = store.get_by_access("bad").await.unwrap_err();
        assert!(matches!(
            err,
            TokenStoreError::Decoding(DecodingError::UnexpectedType {
                expected: "text",
                found: "blob"
            })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_stored_value_is_distinct_from_not_found() {
        let client = Arc::new(InMemoryMapClient::new());
        let store = MapTokenStore::with_defaults(client.clone()).unwrap();

        let map = client.map("oauth2_codes").await.unwrap();
        map.put_with_ttl(
            "code:torn",
            MapValue::Text("{\"client_id\":".to_string()),
            Duration::ZERO,
        )
        .await
        .unwrap();

        let err = store.get_by_code("torn").await.unwrap_err();
        assert!(matches!(
            err,
            TokenStoreError::Decoding(DecodingError::Malformed { .. })
        ));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_encode_buffer_is_reused_across_creates() {
        let store = memory_store();

        let record = TokenRecord {
            access: Some("a1".to_string()),
            access_expires_in: Some(Duration::from_secs(300)),
            ..test_record()
        };
        store.create(&record).await.unwrap();
        assert_eq!(store.buffers.pooled(), 1);

        let record = TokenRecord {
            access: Some("a2".to_string()),
            access_expires_in: Some(Duration::from_secs(300)),
            ..test_record()
        };
        store.create(&record).await.unwrap();
        assert_eq!(store.buffers.pooled(), 1);
    }

    #[tokio::test]
    async fn test_round_trip_preserves_ancillary_metadata() {
        let store = memory_store();

        let record = TokenRecord {
            access: Some("a1".to_string()),
            access_expires_in: Some(Duration::from_secs(300)),
            redirect_uri: "https://app.example.com/cb".to_string(),
            ..test_record()
        };
        store.create(&record).await.unwrap();

        let found = store.get_by_access("a1").await.unwrap();
        assert_eq!(found.user_id, "user-1");
        assert_eq!(found.scope, "openid profile");
        assert_eq!(found.redirect_uri, "https://app.example.com/cb");
    }
}
