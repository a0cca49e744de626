// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Storage locations: key-addressed places chunk payloads live.
//!
//! The engine only needs `put` / `get` / `exists`; `delete` is used for
//! cleaning up chunks of a failed store. Payloads are stored as raw bytes
//! with no header.
//!
//! ```text
//! DirectoryLocation   <root>/<chunk_id>.chunk
//! MemoryLocation      HashMap<chunk_id, Bytes>
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::LocationError;

pub type LocationResult<T> = std::result::Result<T, LocationError>;

/// A durable, key-addressable store for chunk payloads.
#[async_trait]
pub trait StorageLocation: Send + Sync {
    /// Identifier recorded in chunk manifests.
    fn id(&self) -> &str;

    /// Write `data` under `key`. Must be durable when this returns `Ok`.
    async fn put(&self, key: &str, data: Bytes) -> LocationResult<()>;

    /// Read the payload stored under `key`.
    async fn get(&self, key: &str) -> LocationResult<Bytes>;

    async fn exists(&self, key: &str) -> LocationResult<bool>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> LocationResult<()>;
}

// ─────────────────────────────── DirectoryLocation ───────────────────────────

/// Location backed by a local directory, one file per chunk.
pub struct DirectoryLocation {
    id: String,
    root: PathBuf,
}

impl DirectoryLocation {
    /// Open a directory location, creating `root` if needed.
    pub async fn open(id: impl Into<String>, root: impl AsRef<Path>) -> LocationResult<Self> {
        let id = id.into();
        let root = root.as_ref().to_path_buf();
        if !fs::try_exists(&root).await? {
            fs::create_dir_all(&root).await?;
            info!(location = id, path = ?root, "Created storage location");
        }
        Ok(Self { id, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the payload file for `key`.
    pub fn chunk_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.chunk"))
    }
}

#[async_trait]
impl StorageLocation for DirectoryLocation {
    fn id(&self) -> &str {
        &self.id
    }

    async fn put(&self, key: &str, data: Bytes) -> LocationResult<()> {
        let path = self.chunk_path(key);
        // Write to a temp file and rename so the final key never holds a
        // partial payload.
        let tmp = path.with_extension("chunk.tmp");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> LocationResult<Bytes> {
        match fs::read(self.chunk_path(key)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LocationError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> LocationResult<bool> {
        Ok(fs::try_exists(self.chunk_path(key)).await?)
    }

    async fn delete(&self, key: &str) -> LocationResult<()> {
        match fs::remove_file(self.chunk_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ─────────────────────────────── MemoryLocation ──────────────────────────────

/// Volatile in-process location.
pub struct MemoryLocation {
    id: String,
    chunks: RwLock<HashMap<String, Bytes>>,
}

impl MemoryLocation {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), chunks: RwLock::new(HashMap::new()) }
    }

    /// Number of payloads held.
    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }
}

#[async_trait]
impl StorageLocation for MemoryLocation {
    fn id(&self) -> &str {
        &self.id
    }

    async fn put(&self, key: &str, data: Bytes) -> LocationResult<()> {
        self.chunks.write().insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> LocationResult<Bytes> {
        self.chunks
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| LocationError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> LocationResult<bool> {
        Ok(self.chunks.read().contains_key(key))
    }

    async fn delete(&self, key: &str) -> LocationResult<()> {
        self.chunks.write().remove(key);
        Ok(())
    }
}
