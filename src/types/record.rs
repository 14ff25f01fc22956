//! Token Record
//!
//! The unit of persistence: per-category identifiers and expiries plus
//! the OAuth2 metadata the framework attaches. The store carries the
//! metadata through serialization unchanged and never inspects it.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TokenCategory;

/// Token artifact payload persisted by the store.
///
/// A single record may populate zero, one, two, or three of the
/// access/refresh/code identifiers. Each populated identifier becomes
/// an independent entry in its own map, keyed by that identifier and
/// bounded by its own expiry duration; there is no single storage row
/// holding the triple.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenRecord {
    /// OAuth2 client the artifacts were issued to.
    #[serde(default)]
    pub client_id: String,

    /// Resource owner the artifacts were issued for.
    #[serde(default)]
    pub user_id: String,

    /// Redirect URI bound to the authorization.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub redirect_uri: String,

    /// Granted scope.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,

    /// Access token identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,

    /// Lifetime of the access-token entry. Required when `access` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_expires_in: Option<Duration>,

    /// Refresh token identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,

    /// Lifetime of the refresh-token entry. Required when `refresh` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_expires_in: Option<Duration>,

    /// Authorization code identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Lifetime of the authorization-code entry. Required when `code` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_expires_in: Option<Duration>,

    /// PKCE code challenge, when the code grant used one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    /// PKCE code challenge method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,

    /// When the record was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Additional fields attached by the framework.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TokenRecord {
    /// Identifier populated for a category, if any.
    ///
    /// Empty strings count as unpopulated, matching the framework's
    /// convention of signalling absence with `""`.
    pub fn identifier(&self, category: TokenCategory) -> Option<&str> {
        let id = match category {
            TokenCategory::Access => self.access.as_deref(),
            TokenCategory::Refresh => self.refresh.as_deref(),
            TokenCategory::Code => self.code.as_deref(),
        };
        id.filter(|s| !s.is_empty())
    }

    /// Entry lifetime for a category.
    pub fn expires_in(&self, category: TokenCategory) -> Option<Duration> {
        match category {
            TokenCategory::Access => self.access_expires_in,
            TokenCategory::Refresh => self.refresh_expires_in,
            TokenCategory::Code => self.code_expires_in,
        }
    }

    /// Categories populated on this record, in write order.
    pub fn populated(&self) -> impl Iterator<Item = TokenCategory> + '_ {
        TokenCategory::ALL
            .into_iter()
            .filter(|category| self.identifier(*category).is_some())
    }
}

impl Default for TokenRecord {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            user_id: String::new(),
            redirect_uri: String::new(),
            scope: String::new(),
            access: None,
            access_expires_in: None,
            refresh: None,
            refresh_expires_in: None,
            code: None,
            code_expires_in: None,
            code_challenge: None,
            code_challenge_method: None,
            created_at: Utc::now(),
            extra: HashMap::new(),
        }
    }
}
