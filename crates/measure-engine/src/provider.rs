//! Loads and caches mesh snapshots by file path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use caliper_types::MeshSnapshot;
use mesh_format::{FormatError, MeshLoader};
use tracing::debug;

/// Hands out shared, immutable snapshots. Each path is read once until evicted.
pub struct SnapshotProvider<L: MeshLoader> {
    loader: L,
    cache: HashMap<PathBuf, Arc<MeshSnapshot>>,
}

impl<L: MeshLoader> SnapshotProvider<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cache: HashMap::new(),
        }
    }

    /// Snapshot for `path`, reading it on first use.
    pub fn get(&mut self, path: &Path) -> Result<Arc<MeshSnapshot>, FormatError> {
        if let Some(snapshot) = self.cache.get(path) {
            return Ok(Arc::clone(snapshot));
        }
        let snapshot = Arc::new(self.loader.load(path)?);
        debug!(path = %path.display(), faces = snapshot.faces().len(), "snapshot cached");
        self.cache.insert(path.to_path_buf(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Register a snapshot that was built in memory, e.g. a section result.
    pub fn insert(&mut self, path: impl Into<PathBuf>, snapshot: MeshSnapshot) -> Arc<MeshSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.cache.insert(path.into(), Arc::clone(&snapshot));
        snapshot
    }

    /// Drop the cached snapshot, e.g. when its layer is removed.
    pub fn evict(&mut self, path: &Path) -> bool {
        self.cache.remove(path).is_some()
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache.contains_key(path)
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }
}
