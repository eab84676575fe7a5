//! Plane sectioning: cut a solid, tessellate, export, and wrap the result as a
//! new layer.

use std::path::{Path, PathBuf};

use caliper_types::{Aabb, LayerDescriptor, MeshSnapshot, ModelId, SectionPlane};
use mesh_format::{snapshot_from_render_mesh, MeshExporter};
use solid_kernel::{Kernel, KernelSolidHandle};
use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::SectionError;

/// A successful section, ready to be registered by the host.
#[derive(Debug, Clone)]
pub struct SectionOutcome {
    /// New visible layer named "Section Layer N", holding `model`.
    pub layer: LayerDescriptor,
    pub model: ModelId,
    /// Snapshot of the exported mesh, in world space (identity transform).
    pub snapshot: MeshSnapshot,
    /// The kept half as a kernel solid, so it can be sectioned again.
    pub solid: KernelSolidHandle,
    pub path: PathBuf,
}

/// Runs sections and numbers the resulting layers.
#[derive(Debug, Clone)]
pub struct SectionEngine {
    output_dir: PathBuf,
    triangulation_tolerance: f64,
    min_half_space_extent: f64,
    plane_tolerance: f64,
    next_index: usize,
}

impl SectionEngine {
    pub fn new(config: &EngineConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            triangulation_tolerance: config.triangulation_tolerance,
            min_half_space_extent: config.min_half_space_extent,
            plane_tolerance: config.plane_tolerance,
            next_index: 1,
        }
    }

    /// Number the next successful section will get.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Bounding box of `solid` if `plane` passes through its interior.
    pub fn check_plane<K: Kernel + ?Sized>(
        &self,
        kernel: &K,
        solid: &KernelSolidHandle,
        plane: &SectionPlane,
    ) -> Result<Aabb, SectionError> {
        let bounds = kernel
            .bounding_box(solid)
            .map_err(|e| SectionError::Boolean {
                reason: e.to_string(),
            })?
            .ok_or_else(|| SectionError::NoIntersection {
                reason: "solid is empty".to_string(),
            })?;
        let axis = plane.axis.index();
        let (lo, hi) = (bounds.min[axis], bounds.max[axis]);
        if plane.offset <= lo + self.plane_tolerance || plane.offset >= hi - self.plane_tolerance {
            return Err(SectionError::NoIntersection {
                reason: format!(
                    "{:?} = {} lies outside the solid's range [{}, {}]",
                    plane.axis, plane.offset, lo, hi
                ),
            });
        }
        Ok(bounds)
    }

    /// Keep the part of `solid` behind `plane` (`p[axis] <= offset`), export it
    /// through `exporter`, and describe it as a new layer.
    ///
    /// The source solid is never modified. Intermediate kernel solids are
    /// released on every path.
    #[instrument(skip_all, fields(axis = ?plane.axis, offset = plane.offset))]
    pub fn section<K, E>(
        &mut self,
        kernel: &mut K,
        solid: &KernelSolidHandle,
        plane: &SectionPlane,
        exporter: &mut E,
    ) -> Result<SectionOutcome, SectionError>
    where
        K: Kernel + ?Sized,
        E: MeshExporter + ?Sized,
    {
        let bounds = self.check_plane(kernel, solid, plane)?;
        let extent = self.min_half_space_extent.max(2.0 * bounds.diagonal());

        let half = kernel
            .make_half_space(plane, bounds.center(), extent)
            .map_err(|e| SectionError::Boolean {
                reason: e.to_string(),
            })?;
        let cut = kernel.boolean_intersect(solid, &half);
        kernel.release(&half);
        let cut = cut.map_err(|e| SectionError::Boolean {
            reason: e.to_string(),
        })?;

        match self.finish(kernel, &cut, plane, exporter) {
            Ok((snapshot, path)) => {
                let index = self.next_index;
                self.next_index += 1;
                let model = ModelId::new();
                let layer =
                    LayerDescriptor::single(format!("Section Layer {}", index), model, Some(path.clone()));
                info!(
                    layer = %layer.name,
                    faces = snapshot.faces().len(),
                    path = %path.display(),
                    "section layer created"
                );
                Ok(SectionOutcome {
                    layer,
                    model,
                    snapshot,
                    solid: cut,
                    path,
                })
            }
            Err(e) => {
                warn!(error = %e, "section aborted");
                kernel.release(&cut);
                Err(e)
            }
        }
    }

    fn finish<K, E>(
        &self,
        kernel: &mut K,
        cut: &KernelSolidHandle,
        plane: &SectionPlane,
        exporter: &mut E,
    ) -> Result<(MeshSnapshot, PathBuf), SectionError>
    where
        K: Kernel + ?Sized,
        E: MeshExporter + ?Sized,
    {
        let kept = kernel
            .bounding_box(cut)
            .map_err(|e| SectionError::Boolean {
                reason: e.to_string(),
            })?;
        if kept.is_none() {
            return Err(SectionError::NoIntersection {
                reason: format!("nothing of the solid lies behind {:?} = {}", plane.axis, plane.offset),
            });
        }

        let mesh = kernel
            .tessellate(cut, self.triangulation_tolerance)
            .map_err(|e| SectionError::Triangulation {
                reason: e.to_string(),
            })?;
        if mesh.is_empty() {
            return Err(SectionError::Triangulation {
                reason: "no triangles produced".to_string(),
            });
        }

        let path = self
            .output_dir
            .join(format!("section_layer_{}.stl", self.next_index));
        exporter
            .export(&mesh, &path)
            .map_err(|e| SectionError::Export {
                reason: e.to_string(),
            })?;
        let snapshot = snapshot_from_render_mesh(&mesh).map_err(|e| SectionError::Triangulation {
            reason: e.to_string(),
        })?;
        Ok((snapshot, path))
    }
}
