//! GPU sampler of a square grid
//!
//! The grid is uploaded once per resolution; each sample only rewrites the
//! origin and size.

use std::future::Future;
use std::time::Duration;

use glam::{Vec2, Vec3};

use super::base::SamplerCore;
use super::sample::{Sample, SampleError, DEFAULT_POLL_INTERVAL};
use super::{check_patch_resolution, PatchSampling};
use crate::error::OceanResult;
use crate::ocean::field::OceanField;

pub const DEFAULT_PATCH_RESOLUTION: u32 = 4;

/// Patch width in metres used by callers without a preference
pub const DEFAULT_PATCH_SIZE: f32 = 10.0;

/// Pure function - row-major `resolution x resolution` grid over
/// `[-0.5, 0.5]^2`
pub fn patch_grid(resolution: u32) -> Vec<Vec2> {
    let last = resolution.saturating_sub(1).max(1) as f32;
    (0..resolution)
        .flat_map(|row| {
            (0..resolution).map(move |col| Vec2::new(col as f32 / last - 0.5, row as f32 / last - 0.5))
        })
        .collect()
}

pub struct PatchSampler {
    core: SamplerCore,
    patch_resolution: u32,
}

impl PatchSampler {
    pub fn new(field: &OceanField, patch_resolution: u32) -> OceanResult<Self> {
        check_patch_resolution(patch_resolution)?;
        let count = (patch_resolution * patch_resolution) as usize;
        let core = SamplerCore::new(field, count, "Ocean Patch Sampler")?;
        core.write_queries(&patch_grid(patch_resolution));
        Ok(Self {
            core,
            patch_resolution,
        })
    }

    pub fn patch_resolution(&self) -> u32 {
        self.patch_resolution
    }

    /// Resize the grid, replacing the buffers
    pub fn set_patch_resolution(&mut self, patch_resolution: u32) -> OceanResult<()> {
        check_patch_resolution(patch_resolution)?;
        if patch_resolution == self.patch_resolution {
            return Ok(());
        }
        self.core
            .resize((patch_resolution * patch_resolution) as usize);
        self.core.write_queries(&patch_grid(patch_resolution));
        self.patch_resolution = patch_resolution;
        Ok(())
    }

    pub fn sample_lifetime(&self) -> Duration {
        self.core.lifetime()
    }

    pub fn set_sample_lifetime(&mut self, lifetime: Duration) {
        self.core.set_lifetime(lifetime);
    }

    pub fn sample(&mut self, origin: Vec2, size: f32) -> OceanResult<Sample<Vec<Vec3>>> {
        self.core.dispatch(origin, size, self.core.capacity())
    }

    pub fn sample_async(
        &mut self,
        origin: Vec2,
        size: f32,
    ) -> OceanResult<impl Future<Output = Result<Vec<Vec3>, SampleError>> + Send + 'static> {
        let sample = self.sample(origin, size)?;
        Ok(sample.wait(DEFAULT_POLL_INTERVAL))
    }

    pub fn dispose(self) {
        log::debug!(
            "[PatchSampler::dispose] {}x{} grid",
            self.patch_resolution,
            self.patch_resolution
        );
    }
}

impl PatchSampling for PatchSampler {
    fn patch_resolution(&self) -> u32 {
        self.patch_resolution
    }

    fn sample_lifetime(&self) -> Duration {
        PatchSampler::sample_lifetime(self)
    }

    fn set_sample_lifetime(&mut self, lifetime: Duration) {
        PatchSampler::set_sample_lifetime(self, lifetime)
    }

    fn sample(&mut self, origin: Vec2, size: f32) -> OceanResult<Sample<Vec<Vec3>>> {
        PatchSampler::sample(self, origin, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_grid_layout() {
        let grid = patch_grid(3);
        assert_eq!(grid.len(), 9);
        assert_eq!(grid[0], Vec2::new(-0.5, -0.5));
        assert_eq!(grid[1], Vec2::new(0.0, -0.5));
        assert_eq!(grid[2], Vec2::new(0.5, -0.5));
        // Row-major: the fourth point starts the second row
        assert_eq!(grid[3], Vec2::new(-0.5, 0.0));
        assert_eq!(grid[8], Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_patch_grid_default_resolution() {
        let grid = patch_grid(DEFAULT_PATCH_RESOLUTION);
        assert_eq!(grid.len(), 16);
        assert!(grid.iter().all(|p| p.x.abs() <= 0.5 && p.y.abs() <= 0.5));
    }
}
