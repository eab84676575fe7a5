pub mod bounds;
pub mod layer;
pub mod mode;
pub mod plane;
pub mod snapshot;

pub use bounds::*;
pub use layer::*;
pub use mode::*;
pub use plane::*;
pub use snapshot::*;
