pub mod differential;
pub mod engine;
pub mod mesh;
pub mod presets;
pub mod surface;

pub use differential::StepScaling;
pub use engine::MeshEngine;
pub use mesh::{SampleGrid, ShapeParams};
pub use surface::ShapeConstants;
