//! Loader and exporter seams, with filesystem and in-memory STL stores.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use caliper_types::MeshSnapshot;
use solid_kernel::RenderMesh;
use tracing::info;

use crate::errors::FormatError;
use crate::stl;

/// Reads a model file into a snapshot.
pub trait MeshLoader {
    fn load(&self, path: &Path) -> Result<MeshSnapshot, FormatError>;
}

/// Writes a tessellated mesh to a model file.
pub trait MeshExporter {
    fn export(&mut self, mesh: &RenderMesh, path: &Path) -> Result<(), FormatError>;
}

/// Which STL flavour an exporter writes. Loading always auto-detects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StlEncoding {
    #[default]
    Binary,
    Ascii,
}

impl StlEncoding {
    fn encode(self, mesh: &RenderMesh, path: &Path) -> Result<Vec<u8>, FormatError> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mesh");
        match self {
            StlEncoding::Binary => stl::write_binary(mesh, name),
            StlEncoding::Ascii => stl::write_ascii(mesh, name).map(String::into_bytes),
        }
    }
}

/// STL files on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StlFormat {
    pub encoding: StlEncoding,
}

impl StlFormat {
    pub fn new(encoding: StlEncoding) -> Self {
        Self { encoding }
    }
}

fn io_error(path: &Path, e: std::io::Error) -> FormatError {
    FormatError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

impl MeshLoader for StlFormat {
    fn load(&self, path: &Path) -> Result<MeshSnapshot, FormatError> {
        let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
        let snapshot = stl::read(&bytes)?;
        info!(path = %path.display(), vertices = snapshot.vertices().len(), "loaded STL");
        Ok(snapshot)
    }
}

impl MeshExporter for StlFormat {
    fn export(&mut self, mesh: &RenderMesh, path: &Path) -> Result<(), FormatError> {
        let bytes = self.encoding.encode(mesh, path)?;
        std::fs::write(path, &bytes).map_err(|e| io_error(path, e))?;
        info!(path = %path.display(), triangles = mesh.triangle_count(), "exported STL");
        Ok(())
    }
}

/// STL files held in memory, keyed by path. Used where no filesystem exists
/// (the browser host) and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub encoding: StlEncoding,
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }

    pub fn get(&self, path: &Path) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn remove(&mut self, path: &Path) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl MeshLoader for MemoryStore {
    fn load(&self, path: &Path) -> Result<MeshSnapshot, FormatError> {
        let bytes = self.get(path).ok_or_else(|| FormatError::NotFound {
            path: path.to_path_buf(),
        })?;
        stl::read(bytes)
    }
}

impl MeshExporter for MemoryStore {
    fn export(&mut self, mesh: &RenderMesh, path: &Path) -> Result<(), FormatError> {
        let bytes = self.encoding.encode(mesh, path)?;
        self.files.insert(path.to_path_buf(), bytes);
        Ok(())
    }
}
