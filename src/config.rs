//! Store configuration.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::MemoryStore`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL used when building record links.
    pub instance_url: String,

    /// Hex-encoded 256-bit key for encrypted fields. A random key is
    /// generated when absent, which makes ciphertexts unreadable across
    /// store instances.
    pub encryption_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            instance_url: "https://localhost".to_string(),
            encryption_key: None,
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
