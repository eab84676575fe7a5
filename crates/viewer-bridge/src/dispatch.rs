use measure_engine::{MeasureOutcome, RigidTransform};
use caliper_types::ModelId;
use mesh_format::{MeshExporter, MeshLoader};
use solid_kernel::Kernel;
use tracing::warn;

use crate::messages::{EngineToUi, MarkerView, ModelTransform, UiToEngine};
use crate::viewer_state::{BridgeError, ViewerState};

/// Dispatch a UI message to the viewer state and return a response.
///
/// Failures never escape: they come back as [`EngineToUi::Error`].
pub fn dispatch<K, S>(state: &mut ViewerState<K, S>, msg: UiToEngine) -> EngineToUi
where
    K: Kernel,
    S: MeshLoader + MeshExporter,
{
    match handle_message(state, msg) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "message failed");
            EngineToUi::Error {
                message: e.to_string(),
            }
        }
    }
}

fn handle_message<K, S>(state: &mut ViewerState<K, S>, msg: UiToEngine) -> Result<EngineToUi, BridgeError>
where
    K: Kernel,
    S: MeshLoader + MeshExporter,
{
    match msg {
        // -- Layers --
        UiToEngine::AddModel {
            path,
            name,
            with_solid,
        } => {
            let (layer, info) = state.add_model(&path, name, with_solid)?;
            Ok(EngineToUi::LayerAdded { layer, info })
        }

        UiToEngine::RemoveLayer { layer } => {
            state.remove_layer(layer)?;
            Ok(layers_response(state))
        }

        UiToEngine::SetLayerVisible { layer, visible } => {
            state.set_layer_visible(layer, visible)?;
            Ok(layers_response(state))
        }

        UiToEngine::SelectLayer { layer } => {
            state.select_layer(layer)?;
            Ok(layers_response(state))
        }

        // -- Measuring --
        UiToEngine::SetCamera { camera } => {
            state.set_camera(camera)?;
            Ok(EngineToUi::CameraSet)
        }

        UiToEngine::SetMeasureEnabled { enabled } => {
            state.set_measure_enabled(enabled);
            Ok(measure_state_response(state))
        }

        UiToEngine::SetSelectionMode { mode } => {
            state.set_selection_mode(mode);
            Ok(measure_state_response(state))
        }

        UiToEngine::Pick { x, y } => Ok(match state.pick([x, y])? {
            MeasureOutcome::Disabled | MeasureOutcome::NotFound => EngineToUi::NothingPicked,
            MeasureOutcome::Measured {
                measurement,
                report,
            } => EngineToUi::Measured {
                measurement,
                report,
            },
            MeasureOutcome::TwoPoint { event, report } => EngineToUi::TwoPoint {
                event,
                report,
                markers: markers(state),
            },
        }),

        UiToEngine::ModelInfo => Ok(EngineToUi::ModelInfo {
            report: state.model_info()?,
        }),

        // -- Transforms --
        UiToEngine::MoveModel { dx, dy, dz } => Ok(transforms_response(state.move_selected(dx, dy, dz)?)),

        UiToEngine::NudgeModel { axis, negative } => {
            Ok(transforms_response(state.nudge_selected(axis, negative)?))
        }

        UiToEngine::RotateModel { axis, degrees } => {
            Ok(transforms_response(state.rotate_selected(axis, degrees)?))
        }

        UiToEngine::ResetTransform => Ok(transforms_response(state.reset_selected()?)),

        // -- Sectioning --
        UiToEngine::ToggleSection { enabled } => Ok(EngineToUi::SectionPreview {
            plane: state.toggle_section(enabled)?,
        }),

        UiToEngine::UpdateSection { axis, offset } => Ok(EngineToUi::SectionPreview {
            plane: Some(state.update_section(axis, offset)?),
        }),

        UiToEngine::SaveSection => {
            let (layer, info) = state.save_section()?;
            Ok(EngineToUi::LayerAdded { layer, info })
        }
    }
}

fn layers_response<K, S>(state: &ViewerState<K, S>) -> EngineToUi
where
    K: Kernel,
    S: MeshLoader + MeshExporter,
{
    EngineToUi::LayersChanged {
        layers: state.layers().to_vec(),
        selected: state.selected_layer(),
    }
}

fn measure_state_response<K, S>(state: &ViewerState<K, S>) -> EngineToUi
where
    K: Kernel,
    S: MeshLoader + MeshExporter,
{
    EngineToUi::MeasureStateChanged {
        enabled: state.session().is_enabled(),
        mode: state.session().mode(),
        markers: markers(state),
    }
}

fn markers<K, S>(state: &ViewerState<K, S>) -> Vec<MarkerView>
where
    K: Kernel,
    S: MeshLoader + MeshExporter,
{
    state
        .markers
        .live
        .iter()
        .map(|(handle, center, radius)| MarkerView {
            id: handle.0,
            center: *center,
            radius: *radius,
        })
        .collect()
}

fn transforms_response(changed: Vec<(ModelId, RigidTransform)>) -> EngineToUi {
    EngineToUi::TransformsChanged {
        transforms: changed
            .iter()
            .map(|(model, t)| ModelTransform::new(*model, t))
            .collect(),
    }
}
