//! Token Store Contract
//!
//! The framework-facing storage interface and its map-backed adapter.

pub mod map_store;

pub use map_store::{map_token_store, MapTokenStore};

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::TokenRecord;

/// Storage contract consumed by the authorization-server framework.
///
/// This is the entire external API surface of the store. Every
/// operation is one request/response cycle against the backing map
/// store; dropping the returned future cancels the operation, and no
/// operation retries internally.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist the populated token artifacts of a record, one map entry
    /// per populated category.
    async fn create(&self, record: &TokenRecord) -> StoreResult<()>;

    /// Look up the record stored under an authorization code.
    async fn get_by_code(&self, code: &str) -> StoreResult<TokenRecord>;

    /// Look up the record stored under an access token.
    async fn get_by_access(&self, access: &str) -> StoreResult<TokenRecord>;

    /// Look up the record stored under a refresh token.
    async fn get_by_refresh(&self, refresh: &str) -> StoreResult<TokenRecord>;

    /// Delete the authorization-code entry. Absent entries are not an
    /// error.
    async fn remove_by_code(&self, code: &str) -> StoreResult<()>;

    /// Delete the access-token entry. Absent entries are not an error.
    async fn remove_by_access(&self, access: &str) -> StoreResult<()>;

    /// Delete the refresh-token entry. Absent entries are not an error.
    async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()>;
}
