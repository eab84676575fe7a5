//! WASM entry points for the viewer worker.
//!
//! This module is only compiled for the `wasm32` target. Files live in an
//! in-memory store: JavaScript writes uploaded meshes in with `put_file` and
//! reads exported sections back with `take_file`.

use std::path::Path;

use wasm_bindgen::prelude::*;

use caliper_types::{LayerId, ModelId};
use measure_engine::EngineConfig;
use mesh_format::MemoryStore;
use solid_kernel::TruckKernel;

use crate::dispatch;
use crate::messages::{EngineToUi, UiToEngine};
use crate::viewer_state::ViewerState;

type WasmViewer = ViewerState<TruckKernel, MemoryStore>;

// Global viewer state, single-threaded in the web worker.
thread_local! {
    static VIEWER: std::cell::RefCell<Option<WasmViewer>> = std::cell::RefCell::new(None);
}

fn error_json(message: &str) -> String {
    serde_json::to_string(&EngineToUi::Error {
        message: message.to_string(),
    })
    .unwrap_or_else(|_| r#"{"type":"Error","message":"serialization failed"}"#.to_string())
}

/// Initialize the viewer. Must be called once before any other function.
///
/// `config_json` may be empty for the default configuration.
#[wasm_bindgen]
pub fn init(config_json: &str) -> String {
    console_error_panic_hook::set_once();

    let config = if config_json.trim().is_empty() {
        EngineConfig::default()
    } else {
        match EngineConfig::from_json(config_json) {
            Ok(c) => c,
            Err(e) => return error_json(&e.to_string()),
        }
    };

    VIEWER.with(|cell| {
        *cell.borrow_mut() = Some(ViewerState::new(
            TruckKernel::new(),
            MemoryStore::new(),
            config,
            "sections",
        ));
    });
    r#"{"type":"Ready"}"#.to_string()
}

/// Process a JSON `UiToEngine` message and return a JSON `EngineToUi` response.
#[wasm_bindgen]
pub fn process_message(json_input: &str) -> String {
    let response = VIEWER.with(|cell| {
        let mut viewer = cell.borrow_mut();
        let Some(viewer) = viewer.as_mut() else {
            return EngineToUi::Error {
                message: "viewer not initialized, call init() first".to_string(),
            };
        };

        let msg: UiToEngine = match serde_json::from_str(json_input) {
            Ok(msg) => msg,
            Err(e) => {
                return EngineToUi::Error {
                    message: format!("Failed to parse message: {}", e),
                };
            }
        };

        dispatch::dispatch(viewer, msg)
    });

    serde_json::to_string(&response).unwrap_or_else(|e| error_json(&format!("Serialization failed: {}", e)))
}

/// Store file bytes so a later `AddModel` can load them from `path`.
#[wasm_bindgen]
pub fn put_file(path: &str, bytes: &[u8]) -> bool {
    VIEWER.with(|cell| match cell.borrow_mut().as_mut() {
        Some(viewer) => {
            viewer.store_mut().insert(path, bytes.to_vec());
            true
        }
        None => false,
    })
}

/// Remove and return a stored file, e.g. an exported section.
#[wasm_bindgen]
pub fn take_file(path: &str) -> Option<Vec<u8>> {
    VIEWER.with(|cell| cell.borrow_mut().as_mut()?.store_mut().remove(Path::new(path)))
}

fn with_layer_model<T>(layer_id: &str, f: impl FnOnce(&WasmViewer, ModelId) -> T) -> Option<T> {
    let id = LayerId(uuid::Uuid::parse_str(layer_id).ok()?);
    VIEWER.with(|cell| {
        let viewer = cell.borrow();
        let viewer = viewer.as_ref()?;
        let model = *viewer.layer(id)?.models.first()?;
        Some(f(viewer, model))
    })
}

/// Untransformed vertex positions of a layer's model, `[x0, y0, z0, x1, ...]`.
#[wasm_bindgen]
pub fn get_layer_vertices(layer_id: &str) -> js_sys::Float64Array {
    with_layer_model(layer_id, |viewer, model| {
        let flat: Vec<f64> = viewer
            .model(&model)
            .map(|m| m.snapshot.vertices().iter().flatten().copied().collect())
            .unwrap_or_default();
        js_sys::Float64Array::from(flat.as_slice())
    })
    .unwrap_or_else(|| js_sys::Float64Array::new_with_length(0))
}

/// Faces of a layer's model fanned into triangles, three indices each.
#[wasm_bindgen]
pub fn get_layer_indices(layer_id: &str) -> js_sys::Uint32Array {
    with_layer_model(layer_id, |viewer, model| {
        let mut flat: Vec<u32> = Vec::new();
        if let Some(m) = viewer.model(&model) {
            for face in m.snapshot.faces() {
                for k in 1..face.len().saturating_sub(1) {
                    flat.extend([face[0] as u32, face[k] as u32, face[k + 1] as u32]);
                }
            }
        }
        js_sys::Uint32Array::from(flat.as_slice())
    })
    .unwrap_or_else(|| js_sys::Uint32Array::new_with_length(0))
}
