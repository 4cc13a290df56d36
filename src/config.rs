//! Configuration for fingerprint rendering and storage.

use crate::error::{PhashError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Block rendering configuration.
    pub render: RenderConfig,

    /// Storage configuration.
    pub storage: StorageConfig,
}

impl Config {
    /// Loads configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that serde cannot reject on its own.
    pub fn validate(&self) -> Result<()> {
        if self.render.block_size == 0 {
            return Err(PhashError::Config(
                "render.block_size must be greater than zero".to_string(),
            ));
        }
        if self.storage.buffer_capacity == 0 {
            return Err(PhashError::Config(
                "storage.buffer_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Block rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Edge length in pixels of the square block drawn for every bit.
    /// Default: 10.
    pub block_size: u32,

    /// Color of unset bits.
    /// Default: white.
    pub light: [u8; 3],

    /// Color of set bits.
    /// Default: black.
    pub dark: [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            block_size: 10,
            light: [255, 255, 255],
            dark: [0, 0, 0],
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Capacity of the buffered reader/writer wrapped around files.
    /// Default: 8192.
    pub buffer_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 8 * 1024,
        }
    }
}
