pub mod poly_kernel;
pub mod polygon;
pub mod primitives;
pub mod tessellation;
pub mod traits;
pub mod truck_kernel;
pub mod types;

pub use poly_kernel::PolyKernel;
pub use traits::*;
pub use truck_kernel::TruckKernel;
pub use types::*;
