//! Builders
//!
//! Fluent builder for the token store configuration.

pub mod config;

pub use config::{store_config, StoreConfig, StoreConfigBuilder};
