//! GPU plumbing: device context, error capture, float textures and
//! readback fences

pub mod binding;
pub mod context;
pub mod error_recovery;
pub mod fence;
pub mod texture;

pub use binding::ComputeLayoutBuilder;
pub use context::GpuContext;
pub use error_recovery::GpuErrorRecovery;
pub use fence::{map_read_sample, MapFence};
pub use texture::{allocated_layers, FloatTexture, TextureChannels};

/// Workgroup edge of the 2D compute programs
pub const WORKGROUP_SIZE_2D: u32 = 8;

/// Workgroup size of the 1D sampling program
pub const WORKGROUP_SIZE_1D: u32 = 64;

/// Number of workgroups covering `count` invocations
pub fn workgroup_count(count: u32, workgroup_size: u32) -> u32 {
    count.div_ceil(workgroup_size)
}
