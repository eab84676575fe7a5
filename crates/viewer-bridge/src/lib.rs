//! Host surface for the measurement viewer: layer registry, JSON message
//! dispatch and, on wasm32, the worker entry points.

pub mod dispatch;
pub mod messages;
pub mod viewer_state;

#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

pub use dispatch::dispatch;
pub use messages::{EngineToUi, MarkerView, ModelTransform, UiToEngine};
pub use viewer_state::{BridgeError, ModelEntry, ViewerState};
