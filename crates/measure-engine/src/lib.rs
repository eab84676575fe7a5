//! Interactive measurement and cross-section engine.
//!
//! Turns a cursor position into the nearest mesh primitive under a rigid
//! transform, measures it, runs the two-point distance workflow, and cuts
//! solids by axis-aligned planes into new layers.

pub mod calculator;
pub mod config;
pub mod error;
pub mod geometry;
pub mod picker;
pub mod projector;
pub mod provider;
pub mod report;
pub mod section;
pub mod session;
pub mod transform;
pub mod two_point;

pub use calculator::{measure, Measurement};
pub use config::EngineConfig;
pub use error::{EngineError, SectionError};
pub use picker::{pick, PickOutcome, PickResult};
pub use projector::{Camera, ScreenProjector};
pub use provider::SnapshotProvider;
pub use report::Report;
pub use section::{SectionEngine, SectionOutcome};
pub use session::{MeasureOutcome, MeasureSession};
pub use transform::{RigidTransform, TransformStore};
pub use two_point::{MarkerHandle, MarkerSink, RecordingSink, TwoPointEvent, TwoPointSession};
