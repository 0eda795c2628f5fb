//! Spectral ocean surface
//!
//! A builder turns [`OceanFieldParams`] into a field; the field's `update`
//! evaluates the cascades for a point in time; samplers answer height
//! queries against the result; buoyancy turns those answers into forces.
//! Every stage exists on the GPU ([`OceanField`]) and on the CPU
//! ([`CpuOceanField`]); both sit behind [`OceanSurface`].

pub mod buoyancy;
pub mod builder;
pub mod cache;
pub mod cpu_field;
pub mod cpu_field_data;
pub mod cpu_field_operations;
pub mod field;
pub mod gpu_types;
pub mod noise;
pub mod params;
pub mod sampler;
pub mod spectrum;

pub use buoyancy::{FloatingBody, FloatingBodyOptions, OceanFieldBuoyancy};
pub use builder::OceanFieldBuilder;
pub use cache::ResolutionCache;
pub use cpu_field::{CpuOceanField, CpuOceanFieldBuilder};
pub use cpu_field_data::CpuDataMaps;
pub use field::{FieldShared, OceanField, DATA_MAP_LAYERS};
pub use params::{
    Cascade, OceanFieldOverrides, OceanFieldParams, MAX_CASCADES, MAX_RESOLUTION, MIN_RESOLUTION,
};
pub use sampler::{
    CpuPatchSampler, CpuPointsSampler, PatchSampler, PatchSampling, PointsSampler, Sample,
    SampleError, SampleStatus, WaveSampler,
};
pub use spectrum::{InitialSpectrum, GRAVITY};

use crate::error::OceanResult;

/// An ocean field that can be advanced in time and sampled
pub trait OceanSurface {
    fn params(&self) -> &OceanFieldParams;

    /// Evaluate the surface at `time` seconds
    fn update(&mut self, time: f32) -> OceanResult<()>;

    fn create_points_sampler(&self, points_number: usize) -> OceanResult<Box<dyn WaveSampler>>;

    fn create_patch_sampler(&self, patch_resolution: u32) -> OceanResult<Box<dyn PatchSampling>>;
}

impl OceanSurface for OceanField {
    fn params(&self) -> &OceanFieldParams {
        OceanField::params(self)
    }

    fn update(&mut self, time: f32) -> OceanResult<()> {
        OceanField::update(self, time)
    }

    fn create_points_sampler(&self, points_number: usize) -> OceanResult<Box<dyn WaveSampler>> {
        Ok(Box::new(PointsSampler::new(self, points_number)?))
    }

    fn create_patch_sampler(&self, patch_resolution: u32) -> OceanResult<Box<dyn PatchSampling>> {
        Ok(Box::new(PatchSampler::new(self, patch_resolution)?))
    }
}

impl OceanSurface for CpuOceanField {
    fn params(&self) -> &OceanFieldParams {
        CpuOceanField::params(self)
    }

    fn update(&mut self, time: f32) -> OceanResult<()> {
        CpuOceanField::update(self, time)
    }

    fn create_points_sampler(&self, points_number: usize) -> OceanResult<Box<dyn WaveSampler>> {
        Ok(Box::new(CpuPointsSampler::new(self, points_number)))
    }

    fn create_patch_sampler(&self, patch_resolution: u32) -> OceanResult<Box<dyn PatchSampling>> {
        Ok(Box::new(CpuPatchSampler::new(self, patch_resolution)?))
    }
}
