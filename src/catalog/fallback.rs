//! Process-local fallback map used when the durable catalog cannot be reached.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::storage::manifest::{FileManifest, FileSummary};

#[derive(Default)]
struct Entries {
    /// Manifests in first-insertion order.
    manifests: Vec<FileManifest>,
    /// name → position in `manifests`.
    positions: HashMap<String, usize>,
}

/// Name-keyed manifests, safe for concurrent readers and writers.
#[derive(Default)]
pub struct FallbackStore {
    entries: RwLock<Entries>,
}

impl FallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the manifest for `manifest.name`. A replaced entry
    /// keeps its original listing position.
    pub fn insert(&self, manifest: FileManifest) {
        let mut entries = self.entries.write();
        match entries.positions.get(&manifest.name).copied() {
            Some(pos) => entries.manifests[pos] = manifest,
            None => {
                let pos = entries.manifests.len();
                entries.positions.insert(manifest.name.clone(), pos);
                entries.manifests.push(manifest);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<FileManifest> {
        let entries = self.entries.read();
        entries
            .positions
            .get(name)
            .map(|&pos| entries.manifests[pos].clone())
    }

    /// Summaries in insertion order.
    pub fn summaries(&self) -> Vec<FileSummary> {
        self.entries.read().manifests.iter().map(FileManifest::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
