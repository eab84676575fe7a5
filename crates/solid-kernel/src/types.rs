use std::collections::HashMap;

use caliper_types::Aabb;
use serde::{Deserialize, Serialize};

/// Opaque handle to a solid in the geometry kernel.
/// NEVER persisted. Valid only for the kernel instance that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelSolidHandle(pub(crate) u64);

impl KernelSolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Errors from kernel operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("solid not found: {handle:?}")]
    SolidNotFound { handle: KernelSolidHandle },

    #[error("invalid shape: {reason}")]
    InvalidShape { reason: String },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },
}

/// Triangulated surface produced by tessellation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderMesh {
    /// Flat array of vertex positions [x0, y0, z0, x1, y1, z1, ...].
    pub vertices: Vec<f64>,
    /// Triangle indices into the vertex array, three per triangle.
    pub indices: Vec<u32>,
}

impl RenderMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of vertex `i`. Panics if `i` is out of range.
    pub fn position(&self, i: usize) -> [f64; 3] {
        [
            self.vertices[i * 3],
            self.vertices[i * 3 + 1],
            self.vertices[i * 3 + 2],
        ]
    }

    /// Iterate triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    // ── Mesh Math ───────────────────────────────────────────────────────────

    /// Bounding box over all vertex positions, `None` for a mesh without vertices.
    pub fn bounding_box(&self) -> Option<Aabb> {
        let mut chunks = self.vertices.chunks_exact(3);
        let first = chunks.next()?;
        let mut bounds = Aabb::new([first[0], first[1], first[2]], [first[0], first[1], first[2]]);
        for c in chunks {
            bounds.include(&[c[0], c[1], c[2]]);
        }
        Some(bounds)
    }

    /// Signed enclosed volume by the divergence theorem.
    ///
    /// Positive for a closed mesh with outward-facing triangles. Meaningless
    /// for open meshes.
    pub fn volume(&self) -> f64 {
        let mut volume = 0.0;
        for [a, b, c] in self.triangles() {
            let (p0, p1, p2) = (
                self.position(a as usize),
                self.position(b as usize),
                self.position(c as usize),
            );
            // Signed volume of tetrahedron formed by triangle and origin
            volume += p0[0] * (p1[1] * p2[2] - p2[1] * p1[2])
                + p1[0] * (p2[1] * p0[2] - p0[1] * p2[2])
                + p2[0] * (p0[1] * p1[2] - p1[1] * p0[2]);
        }
        volume / 6.0
    }

    /// Number of undirected edges used by exactly one triangle.
    /// Zero for a watertight mesh.
    pub fn boundary_edge_count(&self) -> usize {
        let mut edge_counts: HashMap<(u32, u32), usize> = HashMap::new();
        for [a, b, c] in self.triangles() {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edge_counts.entry((u.min(v), u.max(v))).or_insert(0) += 1;
            }
        }
        edge_counts.values().filter(|&&n| n == 1).count()
    }
}
