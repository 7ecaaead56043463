//! Runtime configuration types

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Coordinator server settings
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// Region catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl RuntimeConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: RuntimeConfig = serde_json::from_str(&raw)?;
        config.validate()?;

        tracing::info!(path = %path.display(), "Loaded runtime configuration");
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.coordinator.port == 0 {
            return Err(Error::InvalidConfig {
                message: "coordinator.port must be non-zero".to_string(),
            });
        }

        if self.coordinator.request_timeout.is_zero() {
            return Err(Error::InvalidConfig {
                message: "coordinator.request_timeout must be non-zero".to_string(),
            });
        }

        if self.catalog.max_key_len == 0 {
            return Err(Error::InvalidConfig {
                message: "catalog.max_key_len must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Address to bind the HTTP API server
    pub bind_address: String,

    /// Port for the HTTP API server
    pub port: u16,

    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Allow cross-origin requests from any origin
    pub enable_cors: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 2379,
            request_timeout: Duration::from_secs(30),
            enable_cors: true,
        }
    }
}

/// Region catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Number of regions to reserve space for up front
    pub initial_capacity: usize,

    /// Largest start/end key accepted from a heartbeat, in bytes
    pub max_key_len: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            max_key_len: 8 * 1024, // 8KB
        }
    }
}

/// Duration serialization helper for human-readable formats
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
