use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use crate::error::{StorageError, Result};

pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Chunk storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Catalog configuration (optional).
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Where and how chunks are written.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Parent directory of the directory-backed storage locations.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// Size of every chunk except possibly the last, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Ordered storage location ids. Chunk `i` goes to `locations[i % len]`,
    /// so reordering this list changes where new files are placed.
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            chunk_size: default_chunk_size(),
            locations: default_locations(),
        }
    }
}

/// Durable catalog target.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// SQLite database file. When absent the catalog runs fallback-only.
    #[serde(default)]
    pub database: Option<PathBuf>,
}

fn default_base_path() -> PathBuf { PathBuf::from("storage") }
fn default_chunk_size() -> u64 { DEFAULT_CHUNK_SIZE }
fn default_locations() -> Vec<String> {
    vec!["node1".into(), "node2".into(), "node3".into()]
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StorageError::Config(format!("Cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| StorageError::Config(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Location id → directory mapping for directory-backed locations.
    pub fn location_dirs(&self) -> Vec<(String, PathBuf)> {
        self.storage
            .locations
            .iter()
            .map(|id| (id.clone(), self.storage.base_path.join(id)))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.chunk_size == 0 {
            return Err(StorageError::Config("chunk_size must be > 0".into()));
        }
        validate_location_ids(&self.storage.locations)
    }
}

/// Location ids must be non-empty, unique, and usable as a directory name.
pub(crate) fn validate_location_ids(ids: &[String]) -> Result<()> {
    if ids.is_empty() {
        return Err(StorageError::Config("No storage locations defined".into()));
    }
    let mut seen = HashSet::new();
    for id in ids {
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(StorageError::Config(format!("Invalid location id '{id}'")));
        }
        if !seen.insert(id.as_str()) {
            return Err(StorageError::Config(format!("Duplicate location id '{id}'")));
        }
    }
    Ok(())
}
