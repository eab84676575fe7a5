use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use caliper_types::{Aabb, Axis, LayerDescriptor, LayerId, MeshInfo, MeshSnapshot, ModelId, SectionPlane, SelectionMode};
use measure_engine::transform::{self, RigidTransform, TransformStore};
use measure_engine::{
    Camera, EngineConfig, EngineError, MeasureOutcome, MeasureSession, RecordingSink, Report,
    ScreenProjector, SectionEngine, SectionError, SnapshotProvider,
};
use mesh_format::{FormatError, MeshExporter, MeshLoader};
use solid_kernel::{Kernel, KernelError, KernelSolidHandle};
use tracing::{debug, info};

/// A displayed model instance.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub snapshot: Arc<MeshSnapshot>,
    /// Kernel solid for sectioning, in the snapshot's own coordinates.
    pub solid: Option<KernelSolidHandle>,
    pub layer: LayerId,
}

/// Everything the viewer host keeps between messages.
///
/// Generic over the kernel and the file store so the same state runs against
/// the filesystem natively and an in-memory store in the browser.
pub struct ViewerState<K: Kernel, S: MeshLoader + MeshExporter> {
    pub kernel: K,
    provider: SnapshotProvider<S>,
    models: HashMap<ModelId, ModelEntry>,
    layers: Vec<LayerDescriptor>,
    selected: Option<LayerId>,
    transforms: TransformStore,
    session: MeasureSession,
    /// Two-point markers currently on screen.
    pub markers: RecordingSink,
    /// Plane being previewed; `None` while section mode is off.
    section_plane: Option<SectionPlane>,
    sections: SectionEngine,
    camera: Option<Camera>,
    config: EngineConfig,
}

impl<K: Kernel, S: MeshLoader + MeshExporter> ViewerState<K, S> {
    /// Create a viewer state. Section layers are exported under `output_dir`.
    pub fn new(kernel: K, store: S, config: EngineConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            kernel,
            provider: SnapshotProvider::new(store),
            models: HashMap::new(),
            layers: Vec::new(),
            selected: None,
            transforms: TransformStore::new(),
            session: MeasureSession::new(config.clone()),
            markers: RecordingSink::default(),
            section_plane: None,
            sections: SectionEngine::new(&config, output_dir),
            camera: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        self.provider.loader()
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.provider.loader_mut()
    }

    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn selected_layer(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn model(&self, model: &ModelId) -> Option<&ModelEntry> {
        self.models.get(model)
    }

    pub fn transform(&self, model: &ModelId) -> Result<RigidTransform, BridgeError> {
        Ok(*self.transforms.get(model)?)
    }

    pub fn session(&self) -> &MeasureSession {
        &self.session
    }

    pub fn section_plane(&self) -> Option<SectionPlane> {
        self.section_plane
    }

    // ── Layers ───────────────────────────────────────────────────────────

    /// Load a mesh file as a new, selected layer. With `with_solid` the mesh
    /// is also handed to the kernel so the layer can be sectioned.
    pub fn add_model(
        &mut self,
        path: &Path,
        name: Option<String>,
        with_solid: bool,
    ) -> Result<(LayerDescriptor, MeshInfo), BridgeError> {
        let snapshot = self.provider.get(path)?;
        let solid = if with_solid {
            Some(self.kernel.solid_from_mesh(snapshot.vertices(), snapshot.faces())?)
        } else {
            None
        };
        let name = name.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("Layer {}", self.layers.len() + 1))
        });

        let model = ModelId::new();
        let layer = LayerDescriptor::single(name, model, Some(path.to_path_buf()));
        let info = snapshot.info();
        self.register(model, layer.clone(), snapshot, solid);
        self.selected = Some(layer.id);
        info!(layer = %layer.name, faces = info.face_count, "model added");
        Ok((layer, info))
    }

    fn register(
        &mut self,
        model: ModelId,
        layer: LayerDescriptor,
        snapshot: Arc<MeshSnapshot>,
        solid: Option<KernelSolidHandle>,
    ) {
        let pivot = snapshot
            .bounding_box()
            .map(|b| b.center())
            .unwrap_or([0.0; 3]);
        self.transforms.register(model, pivot);
        self.models.insert(
            model,
            ModelEntry {
                snapshot,
                solid,
                layer: layer.id,
            },
        );
        self.layers.push(layer);
    }

    /// Remove a layer, its models, their solids and cached snapshots.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<(), BridgeError> {
        let index = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or(BridgeError::LayerNotFound { layer: id })?;
        let layer = self.layers.remove(index);
        for model in &layer.models {
            if let Some(entry) = self.models.remove(model) {
                if let Some(solid) = entry.solid {
                    self.kernel.release(&solid);
                }
            }
            self.transforms.remove(model);
        }
        if let Some(path) = &layer.path {
            if !self.layers.iter().any(|l| l.path.as_ref() == Some(path)) {
                self.provider.evict(path);
            }
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.session.clear_pending(&mut self.markers);
        debug!(layer = %layer.name, "layer removed");
        Ok(())
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> Result<(), BridgeError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(BridgeError::LayerNotFound { layer: id })?;
        layer.visible = visible;
        Ok(())
    }

    pub fn select_layer(&mut self, id: LayerId) -> Result<(), BridgeError> {
        if self.layer(id).is_none() {
            return Err(BridgeError::LayerNotFound { layer: id });
        }
        self.selected = Some(id);
        Ok(())
    }

    fn selected_descriptor(&self) -> Result<&LayerDescriptor, BridgeError> {
        let id = self.selected.ok_or(BridgeError::NoSelection)?;
        self.layer(id).ok_or(BridgeError::LayerNotFound { layer: id })
    }

    /// The model measured and sectioned for the selected layer.
    fn active_model(&self) -> Result<ModelId, BridgeError> {
        let layer = self.selected_descriptor()?;
        layer.models.first().copied().ok_or(BridgeError::EmptyLayer { layer: layer.id })
    }

    // ── Measuring ────────────────────────────────────────────────────────

    /// Install the camera used to project picks. A camera without a valid
    /// projection is rejected and the previous one stays in place.
    pub fn set_camera(&mut self, camera: Camera) -> Result<(), BridgeError> {
        camera.validate()?;
        self.camera = Some(camera);
        Ok(())
    }

    pub fn set_measure_enabled(&mut self, enabled: bool) {
        self.session.set_enabled(enabled, &mut self.markers);
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.session.set_mode(mode, &mut self.markers);
    }

    /// Measure on the selected layer's model at `cursor`.
    pub fn pick(&mut self, cursor: [f64; 2]) -> Result<MeasureOutcome, BridgeError> {
        if !self.session.is_enabled() {
            return Ok(MeasureOutcome::Disabled);
        }
        let model = self.active_model()?;
        let entry = self.models.get(&model).ok_or(BridgeError::ModelGone { model })?;
        let transform = *self.transforms.get(&model)?;
        let projector = self.camera.as_ref().map(|c| c as &dyn ScreenProjector);
        Ok(self
            .session
            .handle_pick(cursor, model, &entry.snapshot, &transform, projector, &mut self.markers))
    }

    /// Summary of the selected layer's model.
    pub fn model_info(&self) -> Result<Report, BridgeError> {
        let layer = self.selected_descriptor()?;
        let model = self.active_model()?;
        let entry = self.models.get(&model).ok_or(BridgeError::ModelGone { model })?;
        Ok(Report::model_info(
            &layer.name,
            &entry.snapshot.info(),
            self.config.display_decimals,
        ))
    }

    // ── Transforms ───────────────────────────────────────────────────────

    fn selected_models(&self) -> Result<Vec<ModelId>, BridgeError> {
        Ok(self.selected_descriptor()?.models.clone())
    }

    /// Move every model of the selected layer along its local axes.
    pub fn move_selected(&mut self, dx: f64, dy: f64, dz: f64) -> Result<Vec<(ModelId, RigidTransform)>, BridgeError> {
        let mut out = Vec::new();
        for model in self.selected_models()? {
            out.push((model, self.transforms.move_model(&model, dx, dy, dz)?));
        }
        Ok(out)
    }

    /// One configured move step along `axis`.
    pub fn nudge_selected(&mut self, axis: Axis, negative: bool) -> Result<Vec<(ModelId, RigidTransform)>, BridgeError> {
        let step = if negative { -self.config.move_step } else { self.config.move_step };
        let [dx, dy, dz] = axis.unit().map(|c| c * step);
        self.move_selected(dx, dy, dz)
    }

    /// Rotate every model of the selected layer; `None` uses the configured step.
    pub fn rotate_selected(
        &mut self,
        axis: Axis,
        degrees: Option<f64>,
    ) -> Result<Vec<(ModelId, RigidTransform)>, BridgeError> {
        let degrees = degrees.unwrap_or(self.config.rotate_step_degrees);
        let mut out = Vec::new();
        for model in self.selected_models()? {
            out.push((model, self.transforms.rotate_model(&model, axis, degrees)?));
        }
        Ok(out)
    }

    pub fn reset_selected(&mut self) -> Result<Vec<(ModelId, RigidTransform)>, BridgeError> {
        let mut out = Vec::new();
        for model in self.selected_models()? {
            self.transforms.reset(&model)?;
            out.push((model, RigidTransform::identity()));
        }
        Ok(out)
    }

    // ── Sectioning ───────────────────────────────────────────────────────

    /// Turn the section preview on or off. A new preview starts on the X
    /// plane through the selected model's world-space centre.
    pub fn toggle_section(&mut self, enabled: bool) -> Result<Option<SectionPlane>, BridgeError> {
        if !enabled {
            self.section_plane = None;
            return Ok(None);
        }
        if self.section_plane.is_none() {
            let model = self.active_model()?;
            let offset = self.world_bounds(&model)?.map_or(0.0, |b| b.center()[0]);
            self.section_plane = Some(SectionPlane::new(Axis::X, offset));
        }
        Ok(self.section_plane)
    }

    pub fn update_section(&mut self, axis: Axis, offset: f64) -> Result<SectionPlane, BridgeError> {
        if self.section_plane.is_none() {
            return Err(BridgeError::NoSectionPlane);
        }
        let plane = SectionPlane::new(axis, offset);
        self.section_plane = Some(plane);
        Ok(plane)
    }

    fn world_bounds(&self, model: &ModelId) -> Result<Option<Aabb>, BridgeError> {
        let entry = self.models.get(model).ok_or(BridgeError::ModelGone { model: *model })?;
        let t = self.transforms.get(model)?;
        let world: Vec<[f64; 3]> = entry
            .snapshot
            .vertices()
            .iter()
            .map(|p| transform::apply(t, p))
            .collect();
        Ok(Aabb::from_points(&world))
    }

    /// Cut the selected model by the previewed plane and add the kept half as
    /// a new layer.
    pub fn save_section(&mut self) -> Result<(LayerDescriptor, MeshInfo), BridgeError> {
        let plane = self.section_plane.ok_or(BridgeError::NoSectionPlane)?;
        let model = self.active_model()?;
        let entry = self.models.get(&model).ok_or(BridgeError::ModelGone { model })?;
        let solid = entry.solid.clone().ok_or(BridgeError::NoSolid { model })?;
        let transform = *self.transforms.get(&model)?;

        // The cut happens in world space. A moved model gets a temporary solid
        // built from its transformed mesh.
        let world_solid = if transform == RigidTransform::identity() {
            None
        } else {
            let vertices: Vec<[f64; 3]> = entry
                .snapshot
                .vertices()
                .iter()
                .map(|p| transform::apply(&transform, p))
                .collect();
            Some(self.kernel.solid_from_mesh(&vertices, entry.snapshot.faces())?)
        };
        let source = world_solid.as_ref().unwrap_or(&solid);

        let result = self
            .sections
            .section(&mut self.kernel, source, &plane, self.provider.loader_mut());
        if let Some(temp) = &world_solid {
            self.kernel.release(temp);
        }
        let outcome = result?;

        if !self.models.contains_key(&model) {
            self.kernel.release(&outcome.solid);
            return Err(BridgeError::ModelGone { model });
        }
        let info = outcome.snapshot.info();
        let snapshot = self.provider.insert(outcome.path.clone(), outcome.snapshot);
        self.register(outcome.model, outcome.layer.clone(), snapshot, Some(outcome.solid));
        Ok((outcome.layer, info))
    }
}

/// Errors from the viewer bridge layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    #[error("no layer selected")]
    NoSelection,

    #[error("layer not found: {layer:?}")]
    LayerNotFound { layer: LayerId },

    #[error("layer has no models: {layer:?}")]
    EmptyLayer { layer: LayerId },

    #[error("model no longer exists: {model:?}")]
    ModelGone { model: ModelId },

    #[error("model has no solid to section: {model:?}")]
    NoSolid { model: ModelId },

    #[error("no section plane")]
    NoSectionPlane,

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("section failed: {0}")]
    Section(#[from] SectionError),

    #[error("file error: {0}")]
    Format(#[from] FormatError),

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}
