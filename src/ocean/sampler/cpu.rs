//! Samplers over the data maps of a [`CpuOceanField`]
//!
//! Results are computed when the sample is issued, so the returned
//! [`Sample`] is complete on its first status check.

use std::sync::Arc;
use std::time::Duration;

use glam::{Vec2, Vec3};
use parking_lot::RwLock;

use super::patch::patch_grid;
use super::sample::{Sample, SignaledFence, DEFAULT_SAMPLE_LIFETIME};
use super::{check_patch_resolution, check_points, PatchSampling, WaveSampler};
use crate::error::OceanResult;
use crate::ocean::cpu_field::CpuOceanField;
use crate::ocean::cpu_field_data::CpuDataMaps;
use crate::ocean::cpu_field_operations::surface_point;

fn evaluate(
    maps: &RwLock<CpuDataMaps>,
    points: impl Iterator<Item = Vec2>,
    lifetime: Duration,
) -> Sample<Vec<Vec3>> {
    let maps = maps.read();
    let result: Vec<Vec3> = points.map(|xz| surface_point(&maps, xz)).collect();
    Sample::new(Box::new(SignaledFence), move || Ok(result), lifetime)
}

pub struct CpuPointsSampler {
    maps: Arc<RwLock<CpuDataMaps>>,
    points_number: usize,
    lifetime: Duration,
}

impl CpuPointsSampler {
    pub fn new(field: &CpuOceanField, points_number: usize) -> Self {
        Self {
            maps: field.shared_maps().clone(),
            points_number,
            lifetime: DEFAULT_SAMPLE_LIFETIME,
        }
    }

    pub fn points_number(&self) -> usize {
        self.points_number
    }

    pub fn set_points_number(&mut self, points_number: usize) {
        self.points_number = points_number;
    }

    pub fn sample_lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn set_sample_lifetime(&mut self, lifetime: Duration) {
        self.lifetime = lifetime;
    }

    pub fn sample(&mut self, points: &[Vec2]) -> OceanResult<Sample<Vec<Vec3>>> {
        check_points(self.points_number, points)?;
        Ok(evaluate(&self.maps, points.iter().copied(), self.lifetime))
    }
}

impl WaveSampler for CpuPointsSampler {
    fn points_number(&self) -> usize {
        self.points_number
    }

    fn sample_lifetime(&self) -> Duration {
        self.lifetime
    }

    fn set_sample_lifetime(&mut self, lifetime: Duration) {
        self.lifetime = lifetime;
    }

    fn sample(&mut self, points: &[Vec2]) -> OceanResult<Sample<Vec<Vec3>>> {
        CpuPointsSampler::sample(self, points)
    }
}

pub struct CpuPatchSampler {
    maps: Arc<RwLock<CpuDataMaps>>,
    patch_resolution: u32,
    grid: Vec<Vec2>,
    lifetime: Duration,
}

impl CpuPatchSampler {
    pub fn new(field: &CpuOceanField, patch_resolution: u32) -> OceanResult<Self> {
        check_patch_resolution(patch_resolution)?;
        Ok(Self {
            maps: field.shared_maps().clone(),
            patch_resolution,
            grid: patch_grid(patch_resolution),
            lifetime: DEFAULT_SAMPLE_LIFETIME,
        })
    }

    pub fn patch_resolution(&self) -> u32 {
        self.patch_resolution
    }

    pub fn set_patch_resolution(&mut self, patch_resolution: u32) -> OceanResult<()> {
        check_patch_resolution(patch_resolution)?;
        self.patch_resolution = patch_resolution;
        self.grid = patch_grid(patch_resolution);
        Ok(())
    }

    pub fn sample_lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn set_sample_lifetime(&mut self, lifetime: Duration) {
        self.lifetime = lifetime;
    }

    pub fn sample(&mut self, origin: Vec2, size: f32) -> OceanResult<Sample<Vec<Vec3>>> {
        let points = self.grid.iter().map(|p| origin + *p * size);
        Ok(evaluate(&self.maps, points, self.lifetime))
    }
}

impl PatchSampling for CpuPatchSampler {
    fn patch_resolution(&self) -> u32 {
        self.patch_resolution
    }

    fn sample_lifetime(&self) -> Duration {
        self.lifetime
    }

    fn set_sample_lifetime(&mut self, lifetime: Duration) {
        self.lifetime = lifetime;
    }

    fn sample(&mut self, origin: Vec2, size: f32) -> OceanResult<Sample<Vec<Vec3>>> {
        CpuPatchSampler::sample(self, origin, size)
    }
}
