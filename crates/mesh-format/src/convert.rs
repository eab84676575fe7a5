use caliper_types::{MeshSnapshot, SnapshotError};
use solid_kernel::RenderMesh;

/// Build a snapshot directly from a tessellated mesh: one vertex per mesh
/// vertex, one triangular face per index triple.
pub fn snapshot_from_render_mesh(mesh: &RenderMesh) -> Result<MeshSnapshot, SnapshotError> {
    let vertices = (0..mesh.vertex_count()).map(|i| mesh.position(i)).collect();
    let faces = mesh
        .triangles()
        .map(|t| t.iter().map(|&i| i as usize).collect())
        .collect();
    MeshSnapshot::new(vertices, faces)
}
