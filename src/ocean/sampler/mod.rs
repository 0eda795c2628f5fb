//! Water-surface samplers
//!
//! Samplers evaluate the ocean surface at exact query positions and hand
//! the result back through a non-blocking [`Sample`]. GPU samplers read the
//! field's data maps on the device; CPU samplers read the maps of a
//! [`CpuOceanField`](crate::ocean::CpuOceanField).

mod base;
pub mod cpu;
pub mod patch;
pub mod points;
pub mod sample;

use std::time::Duration;

use glam::{Vec2, Vec3};

use crate::error::OceanResult;

pub use cpu::{CpuPatchSampler, CpuPointsSampler};
pub use patch::{patch_grid, PatchSampler, DEFAULT_PATCH_RESOLUTION, DEFAULT_PATCH_SIZE};
pub use points::PointsSampler;
pub use sample::{
    Fence, Sample, SampleError, SampleStatus, SignaledFence, DEFAULT_POLL_INTERVAL,
    DEFAULT_SAMPLE_LIFETIME,
};

/// Smallest accepted patch resolution
pub const MIN_PATCH_RESOLUTION: u32 = 2;

/// Sampler of a fixed number of arbitrary xz positions
pub trait WaveSampler: Send {
    fn points_number(&self) -> usize;

    /// Time a sample may stay pending before it times out
    fn sample_lifetime(&self) -> Duration;

    fn set_sample_lifetime(&mut self, lifetime: Duration);

    /// Issue a sample of `points`; each result is `(x, height, z)`
    ///
    /// `points.len()` must equal [`points_number`](Self::points_number).
    fn sample(&mut self, points: &[Vec2]) -> OceanResult<Sample<Vec<Vec3>>>;
}

/// Sampler of a square grid of positions
pub trait PatchSampling: Send {
    fn patch_resolution(&self) -> u32;

    fn sample_lifetime(&self) -> Duration;

    fn set_sample_lifetime(&mut self, lifetime: Duration);

    /// Issue a sample of the grid centred on `origin`, `size` metres wide
    fn sample(&mut self, origin: Vec2, size: f32) -> OceanResult<Sample<Vec<Vec3>>>;
}

pub(crate) fn check_points(expected: usize, points: &[Vec2]) -> OceanResult<()> {
    if points.len() != expected {
        return Err(SampleError::PointCountMismatch {
            expected,
            actual: points.len(),
        }
        .into());
    }
    Ok(())
}

pub(crate) fn check_patch_resolution(patch_resolution: u32) -> OceanResult<()> {
    if patch_resolution < MIN_PATCH_RESOLUTION {
        return Err(crate::error::OceanError::invalid_config(
            "patch_resolution",
            patch_resolution,
            format!("must be at least {}", MIN_PATCH_RESOLUTION),
        ));
    }
    Ok(())
}
