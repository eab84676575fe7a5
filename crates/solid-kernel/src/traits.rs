use caliper_types::{Aabb, SectionPlane};

use crate::types::*;

/// Solid-modeling operations consumed by the section pipeline.
/// Implemented by TruckKernel (wraps truck) and PolyKernel (planar polyhedra).
pub trait Kernel {
    /// Build a closed solid from a polygon mesh. Faces must be consistently
    /// oriented with outward normals.
    fn solid_from_mesh(
        &mut self,
        vertices: &[[f64; 3]],
        faces: &[Vec<usize>],
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Axis-aligned box spanning `min` to `max`.
    fn make_box(&mut self, min: [f64; 3], max: [f64; 3]) -> Result<KernelSolidHandle, KernelError>;

    /// Box whose face lies on `plane` and which extends `extent` into the
    /// kept side (opposite the plane normal) and `extent` either way along the
    /// other two axes around `center`.
    fn make_half_space(
        &mut self,
        plane: &SectionPlane,
        center: [f64; 3],
        extent: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        let (u, v) = plane.axis.others();
        for i in [u.index(), v.index()] {
            min[i] = center[i] - extent;
            max[i] = center[i] + extent;
        }
        let k = plane.axis.index();
        min[k] = plane.offset - extent;
        max[k] = plane.offset;
        self.make_box(min, max)
    }

    /// Boolean intersection of two solids. An empty result is a valid solid
    /// with no bounding box, not an error.
    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Tessellate a solid to a triangle mesh within `tolerance`.
    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError>;

    /// Bounding box of the solid, `None` if it encloses nothing.
    fn bounding_box(&self, solid: &KernelSolidHandle) -> Result<Option<Aabb>, KernelError>;

    /// Drop a solid. Unknown handles are ignored.
    fn release(&mut self, solid: &KernelSolidHandle);
}
