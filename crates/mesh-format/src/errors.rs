use std::path::PathBuf;

use caliper_types::SnapshotError;

/// Errors while reading or writing mesh files.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("i/o error on {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("malformed STL: {reason}")]
    Malformed { reason: String },

    #[error("mesh has no triangles")]
    EmptyMesh,

    #[error("index {index} out of range (vertex count = {vertex_count})")]
    IndexOutOfRange { index: usize, vertex_count: usize },

    #[error("no file stored at {path:?}")]
    NotFound { path: PathBuf },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
