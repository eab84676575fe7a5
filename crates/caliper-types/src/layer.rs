use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one displayed model instance. Stable for the lifetime of the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelId(pub Uuid);

impl ModelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies a layer in the host's layer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

/// A named, toggleable group of model instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    /// The model instances displayed by this layer.
    pub models: Vec<ModelId>,
    /// File the layer's geometry was read from or exported to.
    pub path: Option<PathBuf>,
}

impl LayerDescriptor {
    /// A visible layer holding a single model.
    pub fn single(name: impl Into<String>, model: ModelId, path: Option<PathBuf>) -> Self {
        Self {
            id: LayerId::new(),
            name: name.into(),
            visible: true,
            models: vec![model],
            path,
        }
    }
}
