// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! SQLite-backed durable catalog.
//!
//! One row per file name. The chunk list is stored as a JSON array; the
//! listing columns are stored alongside so `summaries` never decodes chunks.
//! All statements run on the blocking pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::catalog::DurableBackend;
use crate::error::CatalogError;
use crate::storage::manifest::{Chunk, FileManifest, FileSummary};

type CatalogResult<T> = std::result::Result<T, CatalogError>;

pub struct SqliteCatalog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalog {
    /// Open (or create) the catalog database at `path`.
    pub fn open(path: &Path) -> CatalogResult<Self> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        info!(path = ?path, "Durable catalog opened");
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> CatalogResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    async fn with_conn<T, F>(&self, f: F) -> CatalogResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> CatalogResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || f(&conn.lock())).await?
    }
}

fn init_schema(conn: &Connection) -> CatalogResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS files (
            pk INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            original_size INTEGER NOT NULL,
            mime_type TEXT NOT NULL,
            total_chunks INTEGER NOT NULL,
            upload_time TEXT NOT NULL,
            chunks TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn parse_time(raw: &str) -> CatalogResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CatalogError::Sqlite(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))
}

#[async_trait]
impl DurableBackend for SqliteCatalog {
    async fn ping(&self) -> CatalogResult<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    async fn put(&self, manifest: &FileManifest) -> CatalogResult<()> {
        let manifest = manifest.clone();
        self.with_conn(move |conn| {
            let chunks_json = serde_json::to_string(&manifest.chunks)?;
            conn.execute(
                "INSERT OR REPLACE INTO files (
                    name, original_size, mime_type, total_chunks, upload_time, chunks
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    manifest.name,
                    manifest.original_size as i64,
                    manifest.mime_type,
                    manifest.total_chunks as i64,
                    manifest.upload_time.to_rfc3339(),
                    chunks_json,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, name: &str) -> CatalogResult<Option<FileManifest>> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let row: Option<(i64, String, i64, String, String)> = conn
                .query_row(
                    "SELECT original_size, mime_type, total_chunks, upload_time, chunks
                     FROM files WHERE name = ?1",
                    [&name],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
                )
                .optional()?;

            let Some((original_size, mime_type, total_chunks, upload_time, chunks_json)) = row
            else {
                return Ok(None);
            };
            let chunks: Vec<Chunk> = serde_json::from_str(&chunks_json)?;
            Ok(Some(FileManifest {
                name,
                original_size: original_size as u64,
                mime_type,
                chunks,
                upload_time: parse_time(&upload_time)?,
                total_chunks: total_chunks as u64,
            }))
        })
        .await
    }

    async fn summaries(&self) -> CatalogResult<Vec<FileSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name, original_size, total_chunks, upload_time, mime_type
                 FROM files ORDER BY pk",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?;

            let mut out = Vec::new();
            for row in rows {
                let (name, size, total_chunks, upload_time, mime_type) = row?;
                out.push(FileSummary {
                    name,
                    size: size as u64,
                    total_chunks: total_chunks as u64,
                    upload_time: parse_time(&upload_time)?,
                    mime_type,
                });
            }
            Ok(out)
        })
        .await
    }
}
