// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Manifest types, the durable record of a stored file.
//!
//! A [`FileManifest`] is built once by the chunk engine after every chunk has
//! been written and is never mutated afterwards. Payload bytes live only at
//! their storage location; the manifest carries the digest and size.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One contiguous slice of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Zero-based position within the file (ordering key).
    pub index: u64,
    /// Unique id of this chunk instance; the storage key.
    pub id: String,
    /// Id of the storage location holding the payload.
    pub location: String,
    /// Payload length in bytes.
    pub size: u64,
    /// Hex SHA-256 of the payload, computed at write time.
    pub digest: String,
}

/// Metadata for one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifest {
    pub name: String,
    pub original_size: u64,
    pub mime_type: String,
    /// Not guaranteed to be sorted; order is given by [`Chunk::index`].
    pub chunks: Vec<Chunk>,
    pub upload_time: DateTime<Utc>,
    pub total_chunks: u64,
}

impl FileManifest {
    /// Chunks sorted by index.
    pub fn ordered_chunks(&self) -> Vec<&Chunk> {
        let mut chunks: Vec<&Chunk> = self.chunks.iter().collect();
        chunks.sort_by_key(|c| c.index);
        chunks
    }

    /// Location ids in chunk index order.
    pub fn placement(&self) -> Vec<&str> {
        self.ordered_chunks()
            .into_iter()
            .map(|c| c.location.as_str())
            .collect()
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name.clone(),
            size: self.original_size,
            total_chunks: self.total_chunks,
            upload_time: self.upload_time,
            mime_type: self.mime_type.clone(),
        }
    }

    /// Check the structural invariants: indices are exactly
    /// `0..total_chunks` and sizes add up to `original_size`.
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        if self.total_chunks != self.chunks.len() as u64 {
            return Err(format!(
                "total_chunks is {} but {} chunks are listed",
                self.total_chunks,
                self.chunks.len()
            ));
        }
        for (expected, chunk) in self.ordered_chunks().into_iter().enumerate() {
            if chunk.index != expected as u64 {
                return Err(format!(
                    "chunk indices are not contiguous: expected {expected}, found {}",
                    chunk.index
                ));
            }
        }
        let total: u64 = self.chunks.iter().map(|c| c.size).sum();
        if total != self.original_size {
            return Err(format!(
                "chunk sizes sum to {total} but original_size is {}",
                self.original_size
            ));
        }
        Ok(())
    }
}

/// Listing projection of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub total_chunks: u64,
    pub upload_time: DateTime<Utc>,
    pub mime_type: String,
}
