// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Chunk engine. Splits a byte stream into fixed-size chunks, spreads them
//! over the configured storage locations and reassembles them on demand.
//!
//! ```text
//!  reader ──► [chunk 0][chunk 1][chunk 2][chunk 3] …
//!                │        │        │        │
//!                ▼        ▼        ▼        ▼
//!              node1    node2    node3    node1      (index % locations)
//! ```
//!
//! Placement depends only on the chunk index and the location list, so it can
//! be recomputed from a manifest and needs no shared cursor between uploads.
//! Chunk ids are fresh UUIDs, so concurrent stores never share a storage key.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{validate_location_ids, Config};
use crate::error::{LocationError, Result, StorageError};
use crate::storage::location::{DirectoryLocation, StorageLocation};
use crate::storage::manifest::{Chunk, FileManifest};

/// Index into a location list of length `count` for chunk `index`.
pub fn assign_location(index: u64, count: usize) -> usize {
    (index % count as u64) as usize
}

/// Hex SHA-256 of a chunk payload.
pub fn compute_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

pub struct ChunkEngine {
    chunk_size: u64,
    locations: Vec<Arc<dyn StorageLocation>>,
}

impl ChunkEngine {
    /// Build an engine over an ordered, non-empty list of locations with
    /// unique ids.
    pub fn new(chunk_size: u64, locations: Vec<Arc<dyn StorageLocation>>) -> Result<Self> {
        if chunk_size == 0 {
            return Err(StorageError::Config("chunk_size must be > 0".into()));
        }
        let ids: Vec<String> = locations.iter().map(|l| l.id().to_string()).collect();
        validate_location_ids(&ids)?;
        Ok(Self { chunk_size, locations })
    }

    /// Open one [`DirectoryLocation`] per configured location id.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let mut locations: Vec<Arc<dyn StorageLocation>> = Vec::new();
        for (id, dir) in config.location_dirs() {
            let location = DirectoryLocation::open(id.clone(), &dir).await.map_err(|e| {
                StorageError::Config(format!("Cannot open location '{id}' at {dir:?}: {e}"))
            })?;
            locations.push(Arc::new(location));
        }
        Self::new(config.storage.chunk_size, locations)
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn location_ids(&self) -> Vec<&str> {
        self.locations.iter().map(|l| l.id()).collect()
    }

    /// Location chunk `index` is written to.
    pub fn assign(&self, index: u64) -> &Arc<dyn StorageLocation> {
        &self.locations[assign_location(index, self.locations.len())]
    }

    fn location(&self, id: &str) -> Option<&Arc<dyn StorageLocation>> {
        self.locations.iter().find(|l| l.id() == id)
    }

    /// Read exactly `declared_size` bytes from `reader`, write them as chunks
    /// and return the manifest.
    ///
    /// Every chunk is durably written before this returns. On any failure the
    /// chunks already written by this call are deleted and no manifest is
    /// produced. An empty stream yields a manifest with zero chunks.
    pub async fn store<R>(
        &self,
        name: &str,
        mut reader: R,
        declared_size: u64,
        mime_type: &str,
    ) -> Result<FileManifest>
    where
        R: AsyncRead + Unpin + Send,
    {
        if name.is_empty() {
            return Err(StorageError::Input("file name must not be empty".into()));
        }

        let total_chunks = declared_size.div_ceil(self.chunk_size);
        let mut chunks: Vec<Chunk> = Vec::with_capacity(total_chunks.min(1024) as usize);
        let mut remaining = declared_size;
        let mut index: u64 = 0;

        while remaining > 0 {
            let len = remaining.min(self.chunk_size) as usize;
            let mut buf = vec![0u8; len];
            if let Err(e) = reader.read_exact(&mut buf).await {
                self.discard(&chunks).await;
                return Err(read_error(e, declared_size - remaining, declared_size));
            }
            let data = Bytes::from(buf);

            let chunk_id = Uuid::new_v4().to_string();
            let location = self.assign(index);
            let digest = compute_digest(&data);

            if let Err(source) = location.put(&chunk_id, data).await {
                error!(
                    file = name,
                    chunk = index,
                    location = location.id(),
                    error = %source,
                    "Chunk write failed, aborting store"
                );
                self.discard(&chunks).await;
                return Err(StorageError::StorageWrite {
                    index,
                    chunk_id,
                    location: location.id().to_string(),
                    source,
                });
            }

            debug!(
                file = name,
                chunk = index + 1,
                of = total_chunks,
                location = location.id(),
                bytes = len,
                "Chunk stored"
            );
            chunks.push(Chunk {
                index,
                id: chunk_id,
                location: location.id().to_string(),
                size: len as u64,
                digest,
            });
            remaining -= len as u64;
            index += 1;
        }

        // The stream must end exactly at the declared size.
        let mut probe = [0u8; 1];
        match reader.read(&mut probe).await {
            Ok(0) => {}
            Ok(_) => {
                self.discard(&chunks).await;
                return Err(StorageError::Input(format!(
                    "stream is longer than the declared {declared_size} bytes"
                )));
            }
            Err(e) => {
                self.discard(&chunks).await;
                return Err(StorageError::Input(format!("failed to read input stream: {e}")));
            }
        }

        let manifest = FileManifest {
            name: name.to_string(),
            original_size: declared_size,
            mime_type: mime_type.to_string(),
            total_chunks: chunks.len() as u64,
            chunks,
            upload_time: Utc::now(),
        };
        info!(
            file = name,
            bytes = declared_size,
            chunks = manifest.total_chunks,
            "File stored"
        );
        Ok(manifest)
    }

    /// Reassemble the original bytes described by `manifest`.
    ///
    /// Every chunk is checked for presence, length and digest before its bytes
    /// are used; the first failure aborts with no output. Reads only, so
    /// repeated calls return the same bytes.
    pub async fn reconstruct(&self, manifest: &FileManifest) -> Result<Vec<u8>> {
        manifest
            .check_consistency()
            .map_err(|reason| StorageError::InconsistentManifest {
                name: manifest.name.clone(),
                reason,
            })?;

        let mut out = Vec::with_capacity(manifest.original_size.min(self.chunk_size.saturating_mul(64)) as usize);
        for chunk in manifest.ordered_chunks() {
            let data = self.read_verified(chunk).await?;
            out.extend_from_slice(&data);
            debug!(
                file = manifest.name,
                chunk = chunk.index + 1,
                of = manifest.total_chunks,
                location = chunk.location,
                "Chunk verified"
            );
        }

        info!(
            file = manifest.name,
            bytes = out.len(),
            chunks = manifest.total_chunks,
            "File reconstructed"
        );
        Ok(out)
    }

    async fn read_verified(&self, chunk: &Chunk) -> Result<Bytes> {
        let missing = || StorageError::MissingChunk {
            index: chunk.index,
            chunk_id: chunk.id.clone(),
            location: chunk.location.clone(),
        };

        let Some(location) = self.location(&chunk.location) else {
            warn!(chunk = chunk.index, location = chunk.location, "Chunk refers to unknown location");
            return Err(missing());
        };

        match location.exists(&chunk.id).await {
            Ok(true) => {}
            Ok(false) => return Err(missing()),
            Err(e) => {
                error!(chunk = chunk.index, location = chunk.location, error = %e, "Chunk lookup failed");
                return Err(missing());
            }
        }

        let data = match location.get(&chunk.id).await {
            Ok(data) => data,
            Err(LocationError::NotFound(_)) => return Err(missing()),
            Err(e) => {
                error!(chunk = chunk.index, location = chunk.location, error = %e, "Chunk read failed");
                return Err(missing());
            }
        };

        let corrupt = |reason: String| StorageError::Corruption {
            index: chunk.index,
            chunk_id: chunk.id.clone(),
            location: chunk.location.clone(),
            reason,
        };

        if data.len() as u64 != chunk.size {
            return Err(corrupt(format!(
                "expected {} bytes, found {}",
                chunk.size,
                data.len()
            )));
        }
        let digest = compute_digest(&data);
        if digest != chunk.digest {
            return Err(corrupt(format!(
                "digest mismatch: recorded {}, computed {digest}",
                chunk.digest
            )));
        }
        Ok(data)
    }

    /// Best-effort removal of chunks written by a failed store.
    async fn discard(&self, chunks: &[Chunk]) {
        if chunks.is_empty() {
            return;
        }
        let mut removed = 0usize;
        for chunk in chunks {
            let Some(location) = self.location(&chunk.location) else { continue };
            match location.delete(&chunk.id).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    chunk = chunk.index,
                    location = chunk.location,
                    error = %e,
                    "Failed to remove orphaned chunk"
                ),
            }
        }
        info!(removed, written = chunks.len(), "Cleaned up chunks of aborted store");
    }
}

fn read_error(e: std::io::Error, offset: u64, declared_size: u64) -> StorageError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        StorageError::Input(format!(
            "stream ended before the declared {declared_size} bytes (chunk at offset {offset})"
        ))
    } else {
        StorageError::Input(format!("failed to read input stream at offset {offset}: {e}"))
    }
}
