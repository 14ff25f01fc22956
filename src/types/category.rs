//! Token Categories
//!
//! The three independent token-artifact kinds the store persists, and
//! the key namespacing that keeps them from colliding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Token artifact category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenCategory {
    /// Access token.
    Access,
    /// Refresh token.
    Refresh,
    /// Authorization code.
    Code,
}

impl TokenCategory {
    /// All categories, in the fixed order `create` writes them.
    pub const ALL: [TokenCategory; 3] = [
        TokenCategory::Access,
        TokenCategory::Refresh,
        TokenCategory::Code,
    ];

    /// Namespace prefix used in storage keys.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
            Self::Code => "code",
        }
    }

    /// Default name of the backing map for this category.
    pub fn default_map_name(self) -> &'static str {
        match self {
            Self::Access => "oauth2_access_tokens",
            Self::Refresh => "oauth2_refresh_tokens",
            Self::Code => "oauth2_codes",
        }
    }

    /// Build the namespaced storage key for a raw token value.
    ///
    /// Identical raw values in different categories never collide, even
    /// though each category already lives in its own map.
    pub fn namespaced_key(self, raw: &str) -> String {
        format!("{}:{}", self.prefix(), raw)
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}
