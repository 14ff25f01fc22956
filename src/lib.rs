//! OAuth2 Token Map Store
//!
//! Persistence adapter that stores OAuth2 token artifacts (access
//! tokens, refresh tokens, and authorization codes) in a distributed,
//! TTL-capable key-value map, behind the storage contract an
//! authorization-server framework consumes.
//!
//! The adapter owns no persistent state: it namespaces each token
//! category into its own map and key space, derives each entry's
//! time-to-live from the record, and applies it atomically with the
//! write, leaving expiry enforcement to the backing store. Constructing
//! and connecting the map client is the caller's job; the adapter is
//! handed an already-connected client and validates only that it
//! reports itself running.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use oauth2_token_store::{
//!     store_config, InMemoryMapClient, MapTokenStore, TokenRecord, TokenStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(InMemoryMapClient::new());
//!     let config = store_config()
//!         .access_map_name("access_tokens")
//!         .build()?;
//!     let store = MapTokenStore::new(client, config)?;
//!
//!     let record = TokenRecord {
//!         access: Some("a1".to_string()),
//!         access_expires_in: Some(Duration::from_secs(300)),
//!         client_id: "my-client".to_string(),
//!         ..TokenRecord::default()
//!     };
//!     store.create(&record).await?;
//!
//!     let found = store.get_by_access("a1").await?;
//!     println!("issued to: {}", found.client_id);
//!
//!     store.remove_by_access("a1").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several sub-modules:
//!
//! - `types`: the token record and category types
//! - `error`: error hierarchy
//! - `core`: backing-map contract, in-memory reference backend, and the
//!   encode buffer pool
//! - `builders`: fluent configuration builder
//! - `store`: the storage contract and its map-backed adapter

pub mod builders;
pub mod core;
pub mod error;
pub mod store;
pub mod types;

// Re-export the storage contract and adapter
pub use store::{map_token_store, MapTokenStore, TokenStore};

// Re-export builders
pub use builders::{store_config, StoreConfig, StoreConfigBuilder};

// Re-export errors
pub use error::{
    BackendError, ConfigurationError, ConnectivityError, DecodingError, EncodingError,
    StoreResult, TokenStoreError,
};

// Re-export types
pub use types::{TokenCategory, TokenRecord};

// Re-export core components
pub use core::{
    BufferPool, DistributedMap, InMemoryMapClient, MapClient, MapValue, PooledBuffer,
};
