use serde::{Deserialize, Serialize};

/// Which primitive the picker resolves on the next click.
/// Exactly one mode is active per measurement session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SelectionMode {
    #[default]
    Vertex,
    Edge,
    Face,
    /// Two successive vertex picks produce a distance.
    TwoPoint,
}

impl SelectionMode {
    /// The primitive kind searched by the picker in this mode.
    pub fn primitive(self) -> PrimitiveKind {
        match self {
            SelectionMode::Vertex | SelectionMode::TwoPoint => PrimitiveKind::Vertex,
            SelectionMode::Edge => PrimitiveKind::Edge,
            SelectionMode::Face => PrimitiveKind::Face,
        }
    }
}

/// The kind of mesh primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PrimitiveKind {
    Vertex,
    Edge,
    Face,
}
