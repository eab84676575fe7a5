use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use caliper_types::{Axis, LayerId, SelectionMode};
use measure_engine::{Camera, EngineConfig, TwoPointEvent};
use mesh_format::{MemoryStore, MeshExporter};
use solid_kernel::{Kernel, PolyKernel};
use viewer_bridge::messages::*;
use viewer_bridge::*;

// ── Helper functions ─────────────────────────────────────────────────────

type TestViewer = ViewerState<PolyKernel, MemoryStore>;

fn store_with_box(path: &str, min: [f64; 3], max: [f64; 3]) -> MemoryStore {
    let mut kernel = PolyKernel::new();
    let solid = kernel.make_box(min, max).unwrap();
    let mesh = kernel.tessellate(&solid, 0.1).unwrap();
    let mut store = MemoryStore::new();
    store.export(&mesh, Path::new(path)).unwrap();
    store
}

fn viewer_with_cube() -> (TestViewer, LayerId) {
    let store = store_with_box("cube.stl", [0.0; 3], [1.0; 3]);
    let mut viewer = ViewerState::new(PolyKernel::new(), store, EngineConfig::default(), "sections");
    let response = dispatch(
        &mut viewer,
        UiToEngine::AddModel {
            path: PathBuf::from("cube.stl"),
            name: None,
            with_solid: true,
        },
    );
    let EngineToUi::LayerAdded { layer, .. } = response else {
        panic!("expected LayerAdded, got {:?}", response);
    };
    (viewer, layer.id)
}

fn send(viewer: &mut TestViewer, json: &str) -> EngineToUi {
    let msg: UiToEngine = serde_json::from_str(json).unwrap();
    dispatch(viewer, msg)
}

fn error_message(response: EngineToUi) -> String {
    match response {
        EngineToUi::Error { message } => message,
        other => panic!("expected Error, got {:?}", other),
    }
}

// ── Layers ───────────────────────────────────────────────────────────────

#[test]
fn add_model_reports_mesh_info() {
    let store = store_with_box("part.stl", [0.0; 3], [2.0, 3.0, 4.0]);
    let mut viewer = ViewerState::new(PolyKernel::new(), store, EngineConfig::default(), "out");
    let response = send(&mut viewer, r#"{"type":"AddModel","path":"part.stl"}"#);
    let EngineToUi::LayerAdded { layer, info } = response else {
        panic!("expected LayerAdded, got {:?}", response);
    };
    assert_eq!(layer.name, "part");
    assert!(layer.visible);
    assert_eq!(info.vertex_count, 8);
    assert_eq!(info.face_count, 12);
    assert_eq!(info.edge_count, 18);
    assert_eq!(viewer.selected_layer(), Some(layer.id));
    assert!(viewer.model(&layer.models[0]).unwrap().solid.is_none());
}

#[test]
fn missing_file_is_an_error() {
    let mut viewer = ViewerState::new(PolyKernel::new(), MemoryStore::new(), EngineConfig::default(), "out");
    let message = error_message(send(&mut viewer, r#"{"type":"AddModel","path":"nope.stl"}"#));
    assert!(message.contains("nope.stl"), "{}", message);
    assert!(viewer.layers().is_empty());
}

#[test]
fn remove_layer_releases_everything() {
    let (mut viewer, layer) = viewer_with_cube();
    let model = viewer.layer(layer).unwrap().models[0];
    assert_eq!(viewer.kernel.solid_count(), 1);

    let response = dispatch(&mut viewer, UiToEngine::RemoveLayer { layer });
    let EngineToUi::LayersChanged { layers, selected } = response else {
        panic!("expected LayersChanged, got {:?}", response);
    };
    assert!(layers.is_empty());
    assert_eq!(selected, None);
    assert_eq!(viewer.kernel.solid_count(), 0);
    assert!(viewer.model(&model).is_none());
    assert!(viewer.transform(&model).is_err());

    let again = dispatch(&mut viewer, UiToEngine::RemoveLayer { layer });
    assert!(error_message(again).contains("layer not found"));
}

#[test]
fn visibility_toggles() {
    let (mut viewer, layer) = viewer_with_cube();
    dispatch(&mut viewer, UiToEngine::SetLayerVisible { layer, visible: false });
    assert!(!viewer.layer(layer).unwrap().visible);
}

// ── Measuring ────────────────────────────────────────────────────────────

#[test]
fn pick_requires_measure_mode() {
    let (mut viewer, _) = viewer_with_cube();
    let response = send(&mut viewer, r#"{"type":"Pick","x":400.0,"y":300.0}"#);
    assert!(matches!(response, EngineToUi::NothingPicked));
}

#[test]
fn vertex_pick_reports_position() {
    let (mut viewer, _) = viewer_with_cube();
    dispatch(&mut viewer, UiToEngine::SetCamera { camera: Camera::default() });
    send(&mut viewer, r#"{"type":"SetMeasureEnabled","enabled":true}"#);

    let response = dispatch(&mut viewer, UiToEngine::Pick { x: 400.0, y: 300.0 });
    let EngineToUi::Measured { report, .. } = response else {
        panic!("expected Measured, got {:?}", response);
    };
    assert_eq!(report.title, "Vertex");
    assert_eq!(report.get("Valence").map(|v| v.parse::<usize>().unwrap() >= 3), Some(true));
}

#[test]
fn two_point_over_messages() {
    let (mut viewer, _) = viewer_with_cube();
    dispatch(&mut viewer, UiToEngine::SetCamera { camera: Camera::default() });
    dispatch(&mut viewer, UiToEngine::SetMeasureEnabled { enabled: true });
    let response = send(&mut viewer, r#"{"type":"SetSelectionMode","mode":{"type":"TwoPoint"}}"#);
    assert!(matches!(
        response,
        EngineToUi::MeasureStateChanged {
            enabled: true,
            mode: SelectionMode::TwoPoint,
            ..
        }
    ));

    let first = dispatch(&mut viewer, UiToEngine::Pick { x: 400.0, y: 300.0 });
    let EngineToUi::TwoPoint { event, markers, .. } = first else {
        panic!("expected TwoPoint, got {:?}", first);
    };
    assert!(matches!(event, TwoPointEvent::FirstPoint { .. }));
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].radius, 0.7);

    let second = dispatch(&mut viewer, UiToEngine::Pick { x: 800.0, y: 0.0 });
    let EngineToUi::TwoPoint {
        event: TwoPointEvent::Distance { distance, .. },
        report: Some(report),
        markers,
    } = second
    else {
        panic!("expected a distance, got {:?}", second);
    };
    assert!(distance > 1.0);
    assert!(report.get("Distance").is_some());
    assert!(markers.is_empty());
}

#[test]
fn two_point_across_layers_measures_between_models() {
    let (mut viewer, first) = viewer_with_cube();
    let EngineToUi::LayerAdded { layer: second, .. } = send(&mut viewer, r#"{"type":"AddModel","path":"cube.stl"}"#)
    else {
        panic!("expected LayerAdded");
    };
    dispatch(&mut viewer, UiToEngine::MoveModel { dx: 5.0, dy: 0.0, dz: 0.0 });
    dispatch(&mut viewer, UiToEngine::SetMeasureEnabled { enabled: true });
    dispatch(&mut viewer, UiToEngine::SetSelectionMode { mode: SelectionMode::TwoPoint });

    // Each camera frames its own cube identically, so both picks land on the
    // same vertex index of two different models.
    let looking_at = |x: f64| Camera {
        eye: [x, 0.0, 10.0],
        target: [x, 0.0, 0.0],
        ..Camera::default()
    };
    dispatch(&mut viewer, UiToEngine::SelectLayer { layer: first });
    dispatch(&mut viewer, UiToEngine::SetCamera { camera: looking_at(0.0) });
    let response = dispatch(&mut viewer, UiToEngine::Pick { x: 400.0, y: 300.0 });
    let EngineToUi::TwoPoint {
        event: TwoPointEvent::FirstPoint { index, .. },
        ..
    } = response
    else {
        panic!("expected a first point, got {:?}", response);
    };

    dispatch(&mut viewer, UiToEngine::SelectLayer { layer: second.id });
    dispatch(&mut viewer, UiToEngine::SetCamera { camera: looking_at(5.0) });
    let response = dispatch(&mut viewer, UiToEngine::Pick { x: 400.0, y: 300.0 });
    let EngineToUi::TwoPoint {
        event: TwoPointEvent::Distance { distance, from, to },
        report: Some(_),
        markers,
    } = response
    else {
        panic!("expected a distance from vertex {}, got {:?}", index, response);
    };
    assert_relative_eq!(distance, 5.0, epsilon = 1e-9);
    assert_relative_eq!(to[0] - from[0], 5.0, epsilon = 1e-9);
    assert!(markers.is_empty());
}

#[test]
fn degenerate_camera_is_rejected_and_previous_kept() {
    let (mut viewer, _) = viewer_with_cube();
    dispatch(&mut viewer, UiToEngine::SetCamera { camera: Camera::default() });
    dispatch(&mut viewer, UiToEngine::SetMeasureEnabled { enabled: true });

    let flat = Camera {
        near: 1.0,
        far: 1.0,
        ..Camera::default()
    };
    let message = error_message(dispatch(&mut viewer, UiToEngine::SetCamera { camera: flat }));
    assert!(message.contains("invalid camera"), "{}", message);
    let message = error_message(send(
        &mut viewer,
        r#"{"type":"SetCamera","camera":{"eye":[0,0,10],"target":[0,0,0],"up":[0,1,0],"fov_y_degrees":45,"viewport":[0,600],"near":0.01,"far":100}}"#,
    ));
    assert!(message.contains("viewport"), "{}", message);

    let response = dispatch(&mut viewer, UiToEngine::Pick { x: 400.0, y: 300.0 });
    assert!(matches!(response, EngineToUi::Measured { .. }), "{:?}", response);
}

#[test]
fn switching_mode_removes_markers() {
    let (mut viewer, _) = viewer_with_cube();
    dispatch(&mut viewer, UiToEngine::SetMeasureEnabled { enabled: true });
    dispatch(&mut viewer, UiToEngine::SetSelectionMode { mode: SelectionMode::TwoPoint });
    dispatch(&mut viewer, UiToEngine::Pick { x: 0.0, y: 0.0 });
    assert_eq!(viewer.markers.live.len(), 1);

    let response = dispatch(&mut viewer, UiToEngine::SetSelectionMode { mode: SelectionMode::Edge });
    let EngineToUi::MeasureStateChanged { markers, .. } = response else {
        panic!("expected MeasureStateChanged, got {:?}", response);
    };
    assert!(markers.is_empty());
}

#[test]
fn model_info_report() {
    let (mut viewer, _) = viewer_with_cube();
    let response = dispatch(&mut viewer, UiToEngine::ModelInfo);
    let EngineToUi::ModelInfo { report } = response else {
        panic!("expected ModelInfo, got {:?}", response);
    };
    assert_eq!(report.title, "Model: cube");
    assert_eq!(report.get("Size X"), Some("1.00"));
    assert_eq!(report.get("Edges"), Some("18"));
}

// ── Transforms ───────────────────────────────────────────────────────────

#[test]
fn nudge_moves_by_configured_step() {
    let (mut viewer, _) = viewer_with_cube();
    let response = send(&mut viewer, r#"{"type":"NudgeModel","axis":"X"}"#);
    let EngineToUi::TransformsChanged { transforms } = response else {
        panic!("expected TransformsChanged, got {:?}", response);
    };
    assert_eq!(transforms.len(), 1);
    // Column-major: translation in the last column.
    assert_relative_eq!(transforms[0].matrix[12], 10.0);
    assert_relative_eq!(transforms[0].matrix[13], 0.0);
}

#[test]
fn full_turn_of_rotate_steps_is_identity() {
    let (mut viewer, layer) = viewer_with_cube();
    let model = viewer.layer(layer).unwrap().models[0];
    for _ in 0..24 {
        dispatch(&mut viewer, UiToEngine::RotateModel { axis: Axis::Z, degrees: None });
    }
    let t = viewer.transform(&model).unwrap();
    let m = ModelTransform::new(model, &t);
    let identity = ModelTransform::new(model, &measure_engine::RigidTransform::identity());
    for (a, b) in m.matrix.iter().zip(identity.matrix.iter()) {
        assert_relative_eq!(a, b, epsilon = 1e-9);
    }
    dispatch(&mut viewer, UiToEngine::ResetTransform);
    assert_eq!(viewer.transform(&model).unwrap(), measure_engine::RigidTransform::identity());
}

#[test]
fn transforms_need_a_selection() {
    let (mut viewer, layer) = viewer_with_cube();
    dispatch(&mut viewer, UiToEngine::RemoveLayer { layer });
    let message = error_message(dispatch(&mut viewer, UiToEngine::MoveModel { dx: 1.0, dy: 0.0, dz: 0.0 }));
    assert_eq!(message, "no layer selected");
}

// ── Sectioning ───────────────────────────────────────────────────────────

#[test]
fn save_section_without_plane_fails() {
    let (mut viewer, _) = viewer_with_cube();
    let message = error_message(dispatch(&mut viewer, UiToEngine::SaveSection));
    assert_eq!(message, "no section plane");
    let message = error_message(dispatch(&mut viewer, UiToEngine::UpdateSection { axis: Axis::Y, offset: 0.5 }));
    assert_eq!(message, "no section plane");
}

#[test]
fn section_preview_starts_at_model_centre() {
    let (mut viewer, _) = viewer_with_cube();
    let response = dispatch(&mut viewer, UiToEngine::ToggleSection { enabled: true });
    let EngineToUi::SectionPreview { plane: Some(plane) } = response else {
        panic!("expected a preview plane, got {:?}", response);
    };
    assert_eq!(plane.axis, Axis::X);
    assert_relative_eq!(plane.offset, 0.5);

    let off = dispatch(&mut viewer, UiToEngine::ToggleSection { enabled: false });
    assert!(matches!(off, EngineToUi::SectionPreview { plane: None }));
}

#[test]
fn save_section_adds_layer_and_file() {
    let (mut viewer, source) = viewer_with_cube();
    dispatch(&mut viewer, UiToEngine::ToggleSection { enabled: true });
    dispatch(&mut viewer, UiToEngine::UpdateSection { axis: Axis::Z, offset: 0.25 });
    let response = dispatch(&mut viewer, UiToEngine::SaveSection);
    let EngineToUi::LayerAdded { layer, info } = response else {
        panic!("expected LayerAdded, got {:?}", response);
    };
    assert_eq!(layer.name, "Section Layer 1");
    assert_eq!(layer.path, Some(PathBuf::from("sections/section_layer_1.stl")));
    assert!(info.face_count > 0);
    let extents = info.extents.unwrap();
    assert_relative_eq!(extents[2], 0.25, epsilon = 1e-9);

    assert_eq!(viewer.layers().len(), 2);
    assert_eq!(viewer.selected_layer(), Some(source));
    assert!(viewer.store().get(Path::new("sections/section_layer_1.stl")).is_some());
    // Source solid plus the retained section solid.
    assert_eq!(viewer.kernel.solid_count(), 2);
}

#[test]
fn section_of_moved_model_is_in_world_space() {
    let (mut viewer, _) = viewer_with_cube();
    dispatch(&mut viewer, UiToEngine::MoveModel { dx: 10.0, dy: 0.0, dz: 0.0 });
    dispatch(&mut viewer, UiToEngine::ToggleSection { enabled: true });
    assert_relative_eq!(viewer.section_plane().unwrap().offset, 10.5);

    let response = dispatch(&mut viewer, UiToEngine::UpdateSection { axis: Axis::X, offset: 10.25 });
    assert!(matches!(response, EngineToUi::SectionPreview { .. }));
    let EngineToUi::LayerAdded { layer, .. } = dispatch(&mut viewer, UiToEngine::SaveSection) else {
        panic!("expected LayerAdded");
    };
    let model = layer.models[0];
    let bounds = viewer.model(&model).unwrap().snapshot.bounding_box().unwrap();
    assert_relative_eq!(bounds.min[0], 10.0, epsilon = 1e-5);
    assert_relative_eq!(bounds.max[0], 10.25, epsilon = 1e-5);
    assert_eq!(viewer.transform(&model).unwrap(), measure_engine::RigidTransform::identity());
    // The temporary world-space solid is gone.
    assert_eq!(viewer.kernel.solid_count(), 2);
}

#[test]
fn plane_outside_model_is_reported() {
    let (mut viewer, _) = viewer_with_cube();
    dispatch(&mut viewer, UiToEngine::ToggleSection { enabled: true });
    dispatch(&mut viewer, UiToEngine::UpdateSection { axis: Axis::X, offset: 1.5 });
    let message = error_message(dispatch(&mut viewer, UiToEngine::SaveSection));
    assert!(message.contains("does not intersect"), "{}", message);
    assert_eq!(viewer.layers().len(), 1);
}

#[test]
fn section_needs_a_solid() {
    let store = store_with_box("mesh.stl", [0.0; 3], [1.0; 3]);
    let mut viewer = ViewerState::new(PolyKernel::new(), store, EngineConfig::default(), "out");
    send(&mut viewer, r#"{"type":"AddModel","path":"mesh.stl","name":"Mesh only"}"#);
    dispatch(&mut viewer, UiToEngine::ToggleSection { enabled: true });
    let message = error_message(dispatch(&mut viewer, UiToEngine::SaveSection));
    assert!(message.starts_with("model has no solid"), "{}", message);
}
