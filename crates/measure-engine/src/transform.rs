//! Per-model rigid transforms, replaced atomically by move and rotate.

use std::collections::HashMap;

use caliper_types::{Axis, ModelId};
use nalgebra::{Isometry3, Point3, Translation3, Unit, UnitQuaternion, Vector3};
use tracing::debug;

use crate::error::EngineError;

/// Rotation plus translation; no scale or shear.
pub type RigidTransform = Isometry3<f64>;

/// Apply a transform to a raw point.
pub fn apply(transform: &RigidTransform, p: &[f64; 3]) -> [f64; 3] {
    let q = transform.transform_point(&Point3::new(p[0], p[1], p[2]));
    [q.x, q.y, q.z]
}

#[derive(Debug, Clone)]
struct ModelTransform {
    /// Bounding box centre of the untransformed snapshot.
    pivot: [f64; 3],
    current: RigidTransform,
}

/// Cumulative transform of every displayed model instance.
#[derive(Debug, Clone, Default)]
pub struct TransformStore {
    models: HashMap<ModelId, ModelTransform>,
}

impl TransformStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a model with the identity transform. `pivot` is the centre that
    /// rotations turn about.
    pub fn register(&mut self, model: ModelId, pivot: [f64; 3]) {
        self.models.insert(
            model,
            ModelTransform {
                pivot,
                current: RigidTransform::identity(),
            },
        );
    }

    pub fn remove(&mut self, model: &ModelId) -> bool {
        self.models.remove(model).is_some()
    }

    pub fn contains(&self, model: &ModelId) -> bool {
        self.models.contains_key(model)
    }

    pub fn get(&self, model: &ModelId) -> Result<&RigidTransform, EngineError> {
        self.entry(model).map(|m| &m.current)
    }

    fn entry(&self, model: &ModelId) -> Result<&ModelTransform, EngineError> {
        self.models
            .get(model)
            .ok_or(EngineError::UnknownModel { model: *model })
    }

    fn entry_mut(&mut self, model: &ModelId) -> Result<&mut ModelTransform, EngineError> {
        self.models
            .get_mut(model)
            .ok_or(EngineError::UnknownModel { model: *model })
    }

    /// Translate along the model's current local axes: the offset is rotated
    /// by the current rotation only, then composed on the left.
    pub fn move_model(
        &mut self,
        model: &ModelId,
        dx: f64,
        dy: f64,
        dz: f64,
    ) -> Result<RigidTransform, EngineError> {
        let entry = self.entry_mut(model)?;
        let local = entry.current.rotation * Vector3::new(dx, dy, dz);
        entry.current = Translation3::from(local) * entry.current;
        debug!(?model, offset = ?[local.x, local.y, local.z], "model moved");
        Ok(entry.current)
    }

    /// Rotate about `axis` through the untransformed bounding box centre.
    /// The increment is composed on the left.
    pub fn rotate_model(
        &mut self,
        model: &ModelId,
        axis: Axis,
        degrees: f64,
    ) -> Result<RigidTransform, EngineError> {
        let entry = self.entry_mut(model)?;
        let incremental = rotation_about(entry.pivot, axis, degrees);
        entry.current = incremental * entry.current;
        debug!(?model, ?axis, degrees, "model rotated");
        Ok(entry.current)
    }

    /// Restore the identity transform.
    pub fn reset(&mut self, model: &ModelId) -> Result<(), EngineError> {
        self.entry_mut(model)?.current = RigidTransform::identity();
        Ok(())
    }
}

/// Rotation by `degrees` about an axis-parallel line through `pivot`.
pub fn rotation_about(pivot: [f64; 3], axis: Axis, degrees: f64) -> RigidTransform {
    let [x, y, z] = axis.unit();
    let rotation =
        UnitQuaternion::from_axis_angle(&Unit::new_unchecked(Vector3::new(x, y, z)), degrees.to_radians());
    let to_pivot = Translation3::new(pivot[0], pivot[1], pivot[2]);
    to_pivot * rotation * to_pivot.inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn store_with(pivot: [f64; 3]) -> (TransformStore, ModelId) {
        let mut store = TransformStore::new();
        let id = ModelId::new();
        store.register(id, pivot);
        (store, id)
    }

    #[test]
    fn move_follows_local_axes() {
        let (mut store, id) = store_with([0.0; 3]);
        store.rotate_model(&id, Axis::Z, 90.0).unwrap();
        let t = store.move_model(&id, 10.0, 0.0, 0.0).unwrap();
        // After a quarter turn about Z, local +X points along world +Y.
        let p = apply(&t, &[0.0, 0.0, 0.0]);
        assert_relative_eq!(p[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(p[1], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn rotation_keeps_pivot_fixed() {
        let pivot = [0.5, 0.5, 0.5];
        let (mut store, id) = store_with(pivot);
        let t = store.rotate_model(&id, Axis::X, 15.0).unwrap();
        let p = apply(&t, &pivot);
        for i in 0..3 {
            assert_relative_eq!(p[i], pivot[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn unknown_model_is_an_error() {
        let mut store = TransformStore::new();
        let ghost = ModelId::new();
        assert_eq!(
            store.move_model(&ghost, 1.0, 0.0, 0.0),
            Err(EngineError::UnknownModel { model: ghost })
        );
        assert!(store.rotate_model(&ghost, Axis::Y, 15.0).is_err());
        assert!(store.reset(&ghost).is_err());
    }

    #[test]
    fn reset_restores_identity() {
        let (mut store, id) = store_with([1.0, 2.0, 3.0]);
        store.move_model(&id, 1.0, 2.0, 3.0).unwrap();
        store.rotate_model(&id, Axis::Y, 45.0).unwrap();
        store.reset(&id).unwrap();
        assert_eq!(*store.get(&id).unwrap(), RigidTransform::identity());
    }
}
