//! Measurement session: active selection mode, enabled flag and the two-point
//! workflow, driven one pick at a time.

use caliper_types::{MeshSnapshot, ModelId, SelectionMode};
use tracing::{debug, instrument};

use crate::calculator::{measure, Measurement};
use crate::config::EngineConfig;
use crate::picker::{pick, PickOutcome, PickResult};
use crate::projector::ScreenProjector;
use crate::report::Report;
use crate::transform::RigidTransform;
use crate::two_point::{MarkerSink, TwoPointEvent, TwoPointSession};

/// Result of one click while measuring.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureOutcome {
    /// Measurement mode is off; the click was ignored.
    Disabled,
    NotFound,
    Measured {
        measurement: Measurement,
        report: Report,
    },
    /// A two-point pick. `report` is set once a distance is available.
    TwoPoint {
        event: TwoPointEvent,
        report: Option<Report>,
    },
}

#[derive(Debug, Clone)]
pub struct MeasureSession {
    mode: SelectionMode,
    enabled: bool,
    two_point: TwoPointSession,
    config: EngineConfig,
}

impl MeasureSession {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            mode: SelectionMode::default(),
            enabled: false,
            two_point: TwoPointSession::new(config.duplicate_tolerance, config.marker_radius),
            config,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn two_point(&self) -> &TwoPointSession {
        &self.two_point
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Switch the selection mode. Any switch drops a pending two-point pick.
    pub fn set_mode(&mut self, mode: SelectionMode, sink: &mut dyn MarkerSink) {
        if mode != self.mode {
            self.two_point.reset(sink);
            debug!(from = ?self.mode, to = ?mode, "selection mode changed");
            self.mode = mode;
        }
    }

    pub fn set_enabled(&mut self, enabled: bool, sink: &mut dyn MarkerSink) {
        if !enabled {
            self.two_point.reset(sink);
        }
        self.enabled = enabled;
    }

    /// Drop a pending two-point pick, e.g. when its model goes away.
    pub fn clear_pending(&mut self, sink: &mut dyn MarkerSink) {
        self.two_point.reset(sink);
    }

    /// Pick under `cursor` on `model` and measure according to the active mode.
    #[instrument(skip_all, fields(mode = ?self.mode))]
    pub fn handle_pick(
        &mut self,
        cursor: [f64; 2],
        model: ModelId,
        snapshot: &MeshSnapshot,
        transform: &RigidTransform,
        projector: Option<&dyn ScreenProjector>,
        sink: &mut dyn MarkerSink,
    ) -> MeasureOutcome {
        if !self.enabled {
            return MeasureOutcome::Disabled;
        }
        let picked = match pick(cursor, snapshot, transform, self.mode.primitive(), projector) {
            PickOutcome::Found(p) => p,
            PickOutcome::NotFound => return MeasureOutcome::NotFound,
        };
        let decimals = self.config.display_decimals;

        if self.mode == SelectionMode::TwoPoint {
            let PickResult::Vertex { index, position } = picked else {
                return MeasureOutcome::NotFound;
            };
            let event = self.two_point.offer(model, index, position, sink);
            let report = match &event {
                TwoPointEvent::Distance { distance, from, to } => {
                    Some(Report::distance(*distance, from, to, decimals))
                }
                _ => None,
            };
            return MeasureOutcome::TwoPoint { event, report };
        }

        let measurement = measure(&picked, snapshot, transform, &self.config);
        let report = Report::from_measurement(&measurement, decimals);
        MeasureOutcome::Measured {
            measurement,
            report,
        }
    }
}
