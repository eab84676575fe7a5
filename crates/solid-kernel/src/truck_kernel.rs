//! TruckKernel: geometry kernel wrapping truck's B-rep API.

use std::collections::HashMap;

use caliper_types::Aabb;
use tracing::debug;
use truck_modeling::topology::Solid;

use crate::primitives;
use crate::tessellation;
use crate::traits::Kernel;
use crate::types::*;

/// Tolerance handed to truck's boolean operations.
const BOOLEAN_TOLERANCE: f64 = 0.05;

/// Coarse tolerance used when a bounding box has to be estimated from a mesh.
const BOUNDS_TOLERANCE: f64 = 0.05;

/// Geometry kernel backed by the truck B-rep library.
pub struct TruckKernel {
    next_handle: u64,
    solids: HashMap<u64, Solid>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            solids: HashMap::new(),
        }
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    pub(crate) fn store_solid(&mut self, solid: Solid) -> KernelSolidHandle {
        let handle = self.alloc_handle();
        self.solids.insert(handle.id(), solid);
        handle
    }

    pub(crate) fn get_solid(&self, handle: &KernelSolidHandle) -> Result<&Solid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or_else(|| KernelError::SolidNotFound {
                handle: handle.clone(),
            })
    }

    /// Number of live solids.
    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for TruckKernel {
    fn solid_from_mesh(
        &mut self,
        vertices: &[[f64; 3]],
        faces: &[Vec<usize>],
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid = primitives::solid_from_polygons(vertices, faces)?;
        Ok(self.store_solid(solid))
    }

    fn make_box(&mut self, min: [f64; 3], max: [f64; 3]) -> Result<KernelSolidHandle, KernelError> {
        let solid = primitives::make_box(min, max)?;
        Ok(self.store_solid(solid))
    }

    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.get_solid(a)?.clone();
        let solid_b = self.get_solid(b)?.clone();

        let result = truck_shapeops::and(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "truck and() returned None".to_string(),
            }
        })?;
        debug!(shells = result.boundaries().len(), "truck intersection done");
        Ok(self.store_solid(result))
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        let truck_solid = self.get_solid(solid)?;
        tessellation::tessellate_solid(truck_solid, tolerance)
    }

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Result<Option<Aabb>, KernelError> {
        let truck_solid = self.get_solid(solid)?;
        if truck_solid.boundaries().iter().all(|shell| shell.face_iter().next().is_none()) {
            return Ok(None);
        }
        // Curved faces bulge past their vertices, so bound the tessellation.
        let mesh = tessellation::tessellate_solid(truck_solid, BOUNDS_TOLERANCE)?;
        Ok(mesh.bounding_box())
    }

    fn release(&mut self, solid: &KernelSolidHandle) {
        self.solids.remove(&solid.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truck_kernel_store_and_tessellate_box() {
        let mut kernel = TruckKernel::new();
        let handle = kernel.make_box([0.0; 3], [1.0, 1.0, 1.0]).unwrap();

        let mesh = kernel.tessellate(&handle, 0.1).unwrap();

        assert!(!mesh.vertices.is_empty(), "Mesh should have vertices");
        assert!(!mesh.indices.is_empty(), "Mesh should have indices");
        assert_eq!(mesh.boundary_edge_count(), 0, "Box mesh should be closed");
    }

    #[test]
    fn test_truck_kernel_bounding_box() {
        let mut kernel = TruckKernel::new();
        let handle = kernel.make_box([-1.0, 0.0, 2.0], [1.0, 3.0, 4.0]).unwrap();
        let bounds = kernel.bounding_box(&handle).unwrap().unwrap();
        for i in 0..3 {
            assert!((bounds.min[i] - [-1.0, 0.0, 2.0][i]).abs() < 1e-9);
            assert!((bounds.max[i] - [1.0, 3.0, 4.0][i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_truck_kernel_release() {
        let mut kernel = TruckKernel::new();
        let handle = kernel.make_box([0.0; 3], [1.0, 1.0, 1.0]).unwrap();
        assert_eq!(kernel.solid_count(), 1);
        kernel.release(&handle);
        assert_eq!(kernel.solid_count(), 0);
        assert!(matches!(
            kernel.tessellate(&handle, 0.1),
            Err(KernelError::SolidNotFound { .. })
        ));
    }

    #[test]
    fn test_truck_kernel_from_mesh() {
        let mut kernel = TruckKernel::new();
        let vertices = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let faces = vec![vec![0, 2, 1], vec![0, 1, 3], vec![1, 2, 3], vec![2, 0, 3]];
        let handle = kernel.solid_from_mesh(&vertices, &faces).unwrap();
        let bounds = kernel.bounding_box(&handle).unwrap().unwrap();
        assert!((bounds.max[0] - 1.0).abs() < 1e-9);
    }
}
