use std::path::PathBuf;

use caliper_types::{Axis, LayerDescriptor, LayerId, MeshInfo, ModelId, SectionPlane, SelectionMode};
use measure_engine::{Camera, Measurement, Report, RigidTransform, TwoPointEvent};
use serde::{Deserialize, Serialize};

/// Messages from the UI to the viewer engine.
/// Serialized as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UiToEngine {
    // -- Layers --
    /// Load a mesh file as a new layer.
    AddModel {
        path: PathBuf,
        #[serde(default)]
        name: Option<String>,
        /// Also build a kernel solid so the layer can be sectioned.
        #[serde(default)]
        with_solid: bool,
    },
    RemoveLayer {
        layer: LayerId,
    },
    SetLayerVisible {
        layer: LayerId,
        visible: bool,
    },
    SelectLayer {
        layer: LayerId,
    },

    // -- Measuring --
    SetCamera {
        camera: Camera,
    },
    SetMeasureEnabled {
        enabled: bool,
    },
    SetSelectionMode {
        mode: SelectionMode,
    },
    /// User clicked at a screen position.
    Pick {
        x: f64,
        y: f64,
    },
    ModelInfo,

    // -- Transforms (selected layer) --
    MoveModel {
        dx: f64,
        dy: f64,
        dz: f64,
    },
    /// One configured move step along an axis.
    NudgeModel {
        axis: Axis,
        #[serde(default)]
        negative: bool,
    },
    RotateModel {
        axis: Axis,
        /// Defaults to the configured rotation step.
        #[serde(default)]
        degrees: Option<f64>,
    },
    ResetTransform,

    // -- Sectioning --
    ToggleSection {
        enabled: bool,
    },
    UpdateSection {
        axis: Axis,
        offset: f64,
    },
    SaveSection,
}

/// A marker sphere the UI should draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerView {
    pub id: u64,
    pub center: [f64; 3],
    pub radius: f64,
}

/// A model's transform as a column-major 4x4 matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTransform {
    pub model: ModelId,
    pub matrix: [f64; 16],
}

impl ModelTransform {
    pub fn new(model: ModelId, transform: &RigidTransform) -> Self {
        let mut matrix = [0.0; 16];
        matrix.copy_from_slice(transform.to_homogeneous().as_slice());
        Self { model, matrix }
    }
}

/// Messages from the viewer engine to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineToUi {
    /// A layer was created, from a file or a section.
    LayerAdded {
        layer: LayerDescriptor,
        info: MeshInfo,
    },
    /// The layer list or selection changed.
    LayersChanged {
        layers: Vec<LayerDescriptor>,
        selected: Option<LayerId>,
    },
    MeasureStateChanged {
        enabled: bool,
        mode: SelectionMode,
        markers: Vec<MarkerView>,
    },
    CameraSet,
    Measured {
        measurement: Measurement,
        report: Report,
    },
    TwoPoint {
        event: TwoPointEvent,
        report: Option<Report>,
        markers: Vec<MarkerView>,
    },
    /// The click hit nothing, or measuring is off.
    NothingPicked,
    ModelInfo {
        report: Report,
    },
    TransformsChanged {
        transforms: Vec<ModelTransform>,
    },
    SectionPreview {
        plane: Option<SectionPlane>,
    },
    /// An error occurred; the state is unchanged.
    Error {
        message: String,
    },
}
