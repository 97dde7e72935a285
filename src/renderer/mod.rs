pub mod camera;
pub mod frame;
pub mod gpu;
pub mod stereo;
pub mod textures;

pub use camera::ViewRotator;
pub use frame::FramePlan;
pub use gpu::GpuState;
pub use stereo::stereo_pair;
