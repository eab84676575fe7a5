pub mod convert;
pub mod errors;
pub mod io;
pub mod stl;

pub use convert::snapshot_from_render_mesh;
pub use errors::FormatError;
pub use io::{MemoryStore, MeshExporter, MeshLoader, StlEncoding, StlFormat};
