// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! File manager: composes the chunk engine and the catalog.
//!
//! ```text
//! upload   : reader ─► ChunkEngine::store ─► manifest ─► Catalog::save
//! download : name ─► Catalog::find ─► manifest ─► ChunkEngine::reconstruct
//! ```

use std::path::Path;

use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::info;

use crate::catalog::{Catalog, CatalogMode};
use crate::config::Config;
use crate::error::{Result, StorageError};
use crate::storage::engine::ChunkEngine;
use crate::storage::manifest::{FileManifest, FileSummary};

/// Snapshot reported by `chunkvault status`.
#[derive(Debug, Clone)]
pub struct Status {
    pub chunk_size: u64,
    pub locations: Vec<String>,
    pub catalog_mode: CatalogMode,
    pub files: usize,
}

/// Top-level entry point used by the CLI and embedders.
pub struct FileManager {
    pub engine: ChunkEngine,
    pub catalog: Catalog,
}

impl FileManager {
    pub fn new(engine: ChunkEngine, catalog: Catalog) -> Self {
        Self { engine, catalog }
    }

    /// Open directory-backed locations and the catalog from a validated [`Config`].
    pub async fn from_config(config: &Config) -> Result<Self> {
        let engine = ChunkEngine::from_config(config).await?;
        let catalog = Catalog::from_config(&config.catalog);
        info!(
            locations = ?engine.location_ids(),
            chunk_size = engine.chunk_size(),
            base_path = ?config.storage.base_path,
            "File manager ready"
        );
        Ok(Self::new(engine, catalog))
    }

    /// Chunk and store `reader`, then record its manifest.
    pub async fn upload<R>(
        &self,
        name: &str,
        reader: R,
        declared_size: u64,
        mime_type: &str,
    ) -> Result<FileManifest>
    where
        R: AsyncRead + Unpin + Send,
    {
        info!(file = name, bytes = declared_size, "Starting upload");
        let manifest = self.engine.store(name, reader, declared_size, mime_type).await?;
        self.catalog.save(manifest.clone()).await;
        info!(file = name, nodes = ?manifest.placement(), "Upload completed");
        Ok(manifest)
    }

    /// Verified bytes of `name`, or `None` if the catalog does not know it.
    pub async fn download(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let Some(manifest) = self.catalog.find(name).await else {
            info!(file = name, "File not found");
            return Ok(None);
        };
        let data = self.engine.reconstruct(&manifest).await?;
        Ok(Some(data))
    }

    /// Write the verified bytes of `name` to `output_path`.
    ///
    /// The file is created only after every chunk has been verified. Returns
    /// the number of bytes written, or `None` if `name` is unknown.
    pub async fn export(&self, name: &str, output_path: &Path) -> Result<Option<u64>> {
        let Some(data) = self.download(name).await? else {
            return Ok(None);
        };

        let mut out = tokio::fs::File::create(output_path)
            .await
            .map_err(|e| StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("create output {output_path:?}: {e}"),
            )))?;
        out.write_all(&data).await?;
        out.flush().await?;

        info!(file = name, bytes = data.len(), output = ?output_path, "Export complete");
        Ok(Some(data.len() as u64))
    }

    pub async fn list(&self) -> Vec<FileSummary> {
        self.catalog.list().await
    }

    pub async fn status(&self) -> Status {
        Status {
            chunk_size: self.engine.chunk_size(),
            locations: self.engine.location_ids().into_iter().map(String::from).collect(),
            catalog_mode: self.catalog.mode().await,
            files: self.catalog.list().await.len(),
        }
    }
}
