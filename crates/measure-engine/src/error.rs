use caliper_types::{ModelId, SnapshotError};
use mesh_format::FormatError;
use solid_kernel::KernelError;

/// Errors from engine operations other than sectioning.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown model: {model:?}")]
    UnknownModel { model: ModelId },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("invalid camera: {reason}")]
    Camera { reason: String },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Why a section could not be produced. The source model is never modified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SectionError {
    #[error("plane does not intersect the solid: {reason}")]
    NoIntersection { reason: String },

    #[error("triangulation failed: {reason}")]
    Triangulation { reason: String },

    #[error("boolean operation failed: {reason}")]
    Boolean { reason: String },

    #[error("export failed: {reason}")]
    Export { reason: String },
}
