// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Catalog: name-keyed manifests with a durable store and a fallback map.
//!
//! Every call probes the durable backend first and is answered by exactly one
//! backing store:
//!
//! ```text
//!             ping ok?  ──yes──►  DurableBackend   (errors on write/read
//!   call ──►     │                                  degrade to fallback)
//!                └──no───────►  FallbackStore     (process-local map)
//! ```
//!
//! Catalog failures are logged and never returned: a `save` that cannot reach
//! the durable store lands in the fallback map and still succeeds. This trades
//! durability for availability.
//!
//! The two stores are NOT reconciled. Entries saved to the fallback during an
//! outage stay only in memory and are invisible to `find`/`list` once the
//! durable store is reachable again; a durable entry is likewise invisible
//! while the durable store is down. This divergence is a known consistency
//! gap.

pub mod fallback;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::storage::manifest::{FileManifest, FileSummary};

use self::fallback::FallbackStore;
use self::sqlite::SqliteCatalog;

/// A durable manifest store.
#[async_trait]
pub trait DurableBackend: Send + Sync {
    /// Reachability probe, run before every catalog call.
    async fn ping(&self) -> Result<(), CatalogError>;

    /// Insert or replace the manifest for `manifest.name`.
    async fn put(&self, manifest: &FileManifest) -> Result<(), CatalogError>;

    async fn get(&self, name: &str) -> Result<Option<FileManifest>, CatalogError>;

    async fn summaries(&self) -> Result<Vec<FileSummary>, CatalogError>;
}

/// Backing store chosen for a single call.
enum Backend<'a> {
    Durable(&'a dyn DurableBackend),
    Fallback(&'a FallbackStore),
}

/// Which store would answer right now; reported by status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogMode {
    Durable,
    /// Durable store configured but currently unreachable.
    Degraded,
    /// No durable store configured.
    FallbackOnly,
}

pub struct Catalog {
    durable: Option<Arc<dyn DurableBackend>>,
    fallback: FallbackStore,
}

impl Catalog {
    /// Catalog backed by `durable`, falling back to memory when it is down.
    pub fn new(durable: Arc<dyn DurableBackend>) -> Self {
        Self { durable: Some(durable), fallback: FallbackStore::new() }
    }

    /// Catalog with no durable store; every call uses the fallback map.
    pub fn fallback_only() -> Self {
        Self { durable: None, fallback: FallbackStore::new() }
    }

    /// Open the configured durable store. A missing or unopenable database
    /// yields a fallback-only catalog.
    pub fn from_config(config: &CatalogConfig) -> Self {
        let Some(path) = &config.database else {
            warn!("No catalog database configured, using in-memory catalog");
            return Self::fallback_only();
        };
        match SqliteCatalog::open(path) {
            Ok(db) => Self::new(Arc::new(db)),
            Err(e) => {
                error!(path = ?path, error = %e, "Cannot open catalog database");
                warn!("Continuing with in-memory catalog");
                Self::fallback_only()
            }
        }
    }

    async fn select(&self) -> Backend<'_> {
        let Some(durable) = &self.durable else {
            return Backend::Fallback(&self.fallback);
        };
        match durable.ping().await {
            Ok(()) => Backend::Durable(durable.as_ref()),
            Err(e) => {
                warn!(error = %e, "Durable catalog unreachable, using in-memory catalog");
                Backend::Fallback(&self.fallback)
            }
        }
    }

    /// Current answering store.
    pub async fn mode(&self) -> CatalogMode {
        match (self.durable.is_some(), self.select().await) {
            (false, _) => CatalogMode::FallbackOnly,
            (true, Backend::Durable(_)) => CatalogMode::Durable,
            (true, Backend::Fallback(_)) => CatalogMode::Degraded,
        }
    }

    /// Record `manifest` under its name. Never fails: a durable write error
    /// is logged and the manifest goes to the fallback map instead.
    pub async fn save(&self, manifest: FileManifest) {
        match self.select().await {
            Backend::Durable(db) => match db.put(&manifest).await {
                Ok(()) => debug!(file = manifest.name, "Manifest saved"),
                Err(e) => {
                    warn!(file = manifest.name, error = %e, "Durable save failed, saving in memory");
                    self.fallback.insert(manifest);
                }
            },
            Backend::Fallback(mem) => {
                debug!(file = manifest.name, "Manifest saved in memory");
                mem.insert(manifest);
            }
        }
    }

    /// Exact, case-sensitive lookup by name.
    pub async fn find(&self, name: &str) -> Option<FileManifest> {
        match self.select().await {
            Backend::Durable(db) => match db.get(name).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(file = name, error = %e, "Durable lookup failed, reading memory");
                    self.fallback.get(name)
                }
            },
            Backend::Fallback(mem) => mem.get(name),
        }
    }

    /// Summaries of every known file. Order is not specified.
    pub async fn list(&self) -> Vec<FileSummary> {
        match self.select().await {
            Backend::Durable(db) => match db.summaries().await {
                Ok(all) => all,
                Err(e) => {
                    warn!(error = %e, "Durable listing failed, reading memory");
                    self.fallback.summaries()
                }
            },
            Backend::Fallback(mem) => mem.summaries(),
        }
    }
}
