//! Uniform layouts shared with the WGSL compute programs
//!
//! Field order and padding mirror the WGSL structs exactly; the size
//! assertions catch drift at compile time.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use super::params::{OceanFieldParams, MAX_CASCADES};

/// Per-cascade spectrum constants for the initial-spectrum program
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct GpuCascadeSpectrum {
    pub size: f32,
    /// Phillips amplitude `A`
    pub strength: f32,
    pub min_k: f32,
    pub max_k: f32,
}

/// Uniform of `initial_spectrum.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InitialSpectrumUniform {
    pub wind: [f32; 2],
    pub alignment: f32,
    pub resolution: u32,
    pub cascade_count: u32,
    _padding: [u32; 3],
    pub cascades: [GpuCascadeSpectrum; MAX_CASCADES],
}

/// Uniform shared by the time-spectrum, post-process and sampler programs
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FieldUniform {
    pub sizes: [f32; 4],
    pub croppinesses: [f32; 4],
    pub resolution: u32,
    pub cascade_count: u32,
    pub time: f32,
    /// `1 / N^2`
    pub inv_texel_count: f32,
}

/// One entry of the dynamic-offset uniform driving the butterfly passes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FftPassUniform {
    pub stage: u32,
    pub resolution: u32,
    _padding: [u32; 2],
}

/// Uniform of `surface_sampler.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SamplerUniform {
    pub origin: [f32; 2],
    pub size: f32,
    pub count: u32,
}

const_assert_eq!(std::mem::size_of::<GpuCascadeSpectrum>(), 16);
const_assert_eq!(std::mem::size_of::<InitialSpectrumUniform>(), 80);
const_assert_eq!(std::mem::size_of::<FieldUniform>(), 48);
const_assert_eq!(std::mem::size_of::<FftPassUniform>(), 16);
const_assert_eq!(std::mem::size_of::<SamplerUniform>(), 16);

impl InitialSpectrumUniform {
    pub fn from_params(params: &OceanFieldParams) -> Self {
        let mut cascades = [GpuCascadeSpectrum::default(); MAX_CASCADES];
        for (dst, cascade) in cascades.iter_mut().zip(&params.cascades) {
            *dst = GpuCascadeSpectrum {
                size: cascade.size,
                strength: cascade.spectrum_strength(),
                min_k: cascade.min_k(),
                max_k: cascade.max_k(),
            };
        }

        Self {
            wind: params.wind.to_array(),
            alignment: params.alignment,
            resolution: params.resolution,
            cascade_count: params.cascades.len() as u32,
            _padding: [0; 3],
            cascades,
        }
    }
}

impl FieldUniform {
    pub fn from_params(params: &OceanFieldParams, time: f32) -> Self {
        let mut sizes = [1.0; 4];
        let mut croppinesses = [0.0; 4];
        for (i, cascade) in params.cascades.iter().enumerate().take(MAX_CASCADES) {
            sizes[i] = cascade.size;
            croppinesses[i] = cascade.croppiness;
        }
        let n = params.resolution as f32;

        Self {
            sizes,
            croppinesses,
            resolution: params.resolution,
            cascade_count: params.cascades.len() as u32,
            time,
            inv_texel_count: 1.0 / (n * n),
        }
    }
}

impl FftPassUniform {
    pub fn new(stage: u32, resolution: u32) -> Self {
        Self {
            stage,
            resolution,
            _padding: [0; 2],
        }
    }
}
