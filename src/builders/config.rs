//! Store Configuration Builder
//!
//! Fluent builder for the token store configuration.

use crate::core::buffer::BufferPool;
use crate::error::{ConfigurationError, TokenStoreError};
use crate::types::TokenCategory;

/// Token store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Name of the map holding access-token entries.
    pub access_map: String,
    /// Name of the map holding refresh-token entries.
    pub refresh_map: String,
    /// Name of the map holding authorization-code entries.
    pub code_map: String,
    /// Number of encode buffers the store retains for reuse.
    pub buffer_pool_size: usize,
}

impl StoreConfig {
    /// Map name configured for a category.
    pub fn map_name(&self, category: TokenCategory) -> &str {
        match category {
            TokenCategory::Access => &self.access_map,
            TokenCategory::Refresh => &self.refresh_map,
            TokenCategory::Code => &self.code_map,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            access_map: TokenCategory::Access.default_map_name().to_string(),
            refresh_map: TokenCategory::Refresh.default_map_name().to_string(),
            code_map: TokenCategory::Code.default_map_name().to_string(),
            buffer_pool_size: BufferPool::DEFAULT_POOLED,
        }
    }
}

/// Store configuration builder.
#[derive(Default)]
pub struct StoreConfigBuilder {
    access_map: Option<String>,
    refresh_map: Option<String>,
    code_map: Option<String>,
    buffer_pool_size: Option<usize>,
}

impl StoreConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the name of the access-token map.
    pub fn access_map_name(mut self, name: impl Into<String>) -> Self {
        self.access_map = Some(name.into());
        self
    }

    /// Override the name of the refresh-token map.
    pub fn refresh_map_name(mut self, name: impl Into<String>) -> Self {
        self.refresh_map = Some(name.into());
        self
    }

    /// Override the name of the authorization-code map.
    pub fn code_map_name(mut self, name: impl Into<String>) -> Self {
        self.code_map = Some(name.into());
        self
    }

    /// Set the number of pooled encode buffers.
    pub fn buffer_pool_size(mut self, size: usize) -> Self {
        self.buffer_pool_size = Some(size);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// An empty map-name override is rejected with
    /// [`ConfigurationError::EmptyMapName`]; overrides are never
    /// silently replaced with defaults.
    pub fn build(self) -> Result<StoreConfig, TokenStoreError> {
        Ok(StoreConfig {
            access_map: resolve_map_name(self.access_map, TokenCategory::Access)?,
            refresh_map: resolve_map_name(self.refresh_map, TokenCategory::Refresh)?,
            code_map: resolve_map_name(self.code_map, TokenCategory::Code)?,
            buffer_pool_size: self.buffer_pool_size.unwrap_or(BufferPool::DEFAULT_POOLED),
        })
    }
}

fn resolve_map_name(
    name: Option<String>,
    category: TokenCategory,
) -> Result<String, TokenStoreError> {
    match name {
        Some(name) if name.is_empty() => Err(TokenStoreError::Configuration(
            ConfigurationError::EmptyMapName { category },
        )),
        Some(name) => Ok(name),
        None => Ok(category.default_map_name().to_string()),
    }
}

/// Create a store configuration builder.
pub fn store_config() -> StoreConfigBuilder {
    StoreConfigBuilder::new()
}
