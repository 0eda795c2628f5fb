//! GPU ocean field
//!
//! Owns the spectrum, ping-pong and data-map textures of one ocean and the
//! compute programs that turn the initial spectrum into displacement and
//! slope maps for a given time. Every `update` records the whole stage
//! sequence into one command buffer: time spectrum, `log2(N)` horizontal
//! butterfly passes, `log2(N)` vertical passes, post-process.

use std::num::NonZeroU64;
use std::sync::Arc;

use glam::Vec4;
use wgpu::TextureViewDimension;

use super::gpu_types::{FftPassUniform, FieldUniform};
use super::params::{OceanFieldParams, MAX_CASCADES};
use super::sampler::{PatchSampler, PointsSampler};
use super::spectrum::InitialSpectrum;
use crate::error::{OceanError, OceanResult};
use crate::gpu::{
    workgroup_count, ComputeLayoutBuilder, FloatTexture, GpuContext, WORKGROUP_SIZE_2D,
};

/// Spectrum and data-map layers: two packed textures per cascade
pub const DATA_MAP_LAYERS: u32 = 2 * MAX_CASCADES as u32;

/// Field resources read by samplers
///
/// Samplers hold this through an `Arc`, so the data maps stay alive for as
/// long as any sampler can still read them.
pub struct FieldShared {
    /// `DATA_MAP_LAYERS` layers (plus a spare, see
    /// [`allocated_layers`](crate::gpu::allocated_layers)); layer `2c` =
    /// (dx, height, dz, dxdz), layer `2c+1` = (dh/dx, dh/dz, dxdx, dzdz)
    pub data_maps: FloatTexture,
    /// [`FieldUniform`] of the most recent update
    pub uniform: wgpu::Buffer,
}

struct FieldPrograms {
    evolve: wgpu::ComputePipeline,
    horizontal: wgpu::ComputePipeline,
    vertical: wgpu::ComputePipeline,
    post: wgpu::ComputePipeline,
}

struct FieldBindGroups {
    evolve: wgpu::BindGroup,
    // [read spectrum -> write ping-pong, read ping-pong -> write spectrum]
    fft: [wgpu::BindGroup; 2],
    post: wgpu::BindGroup,
}

/// FFT-based ocean surface on the GPU
pub struct OceanField {
    gpu: Arc<GpuContext>,
    params: OceanFieldParams,
    time: f32,

    h0: FloatTexture,
    butterfly: Arc<FloatTexture>,
    // Ping-pong sets: [spectrum, ping-pong]
    sets: [FloatTexture; 2],
    shared: Arc<FieldShared>,

    programs: FieldPrograms,
    bind_groups: FieldBindGroups,
    fft_uniform: wgpu::Buffer,
    fft_stride: u64,
}

impl OceanField {
    /// Allocate textures and compile programs; the initial spectrum is left
    /// zeroed for the builder to fill
    pub(crate) fn new(
        gpu: Arc<GpuContext>,
        params: OceanFieldParams,
        butterfly: Arc<FloatTexture>,
    ) -> OceanResult<Self> {
        gpu.ensure_alive("OceanField::new")?;
        let device = &gpu.device;
        let n = params.resolution;
        let stages = n.trailing_zeros();

        log::info!(
            "[OceanField::new] resolution={} cascades={} butterfly passes={}",
            n,
            params.cascades.len(),
            2 * stages
        );

        let h0 = FloatTexture::storage(device, "Ocean H0", n, MAX_CASCADES as u32);
        let sets = [
            FloatTexture::storage(device, "Ocean Spectrum", n, DATA_MAP_LAYERS),
            FloatTexture::storage(device, "Ocean Ping-Pong", n, DATA_MAP_LAYERS),
        ];
        let data_maps = FloatTexture::storage(device, "Ocean Data Maps", n, DATA_MAP_LAYERS);

        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ocean Field Uniform"),
            size: std::mem::size_of::<FieldUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue.write_buffer(
            &uniform,
            0,
            bytemuck::bytes_of(&FieldUniform::from_params(&params, 0.0)),
        );

        // One aligned entry per butterfly pass, selected by dynamic offset
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let entry_size = std::mem::size_of::<FftPassUniform>() as u64;
        let fft_stride = entry_size.div_ceil(alignment) * alignment;
        let passes = 2 * stages;
        let mut fft_entries = vec![0u8; (fft_stride * passes as u64) as usize];
        for pass in 0..passes {
            let entry = FftPassUniform::new(pass % stages, n);
            let offset = (pass as u64 * fft_stride) as usize;
            fft_entries[offset..offset + entry_size as usize]
                .copy_from_slice(bytemuck::bytes_of(&entry));
        }
        let fft_uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ocean FFT Pass Uniform"),
            size: fft_entries.len() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue.write_buffer(&fft_uniform, 0, &fft_entries);

        let recovery = gpu.recovery();

        let evolve_layout = ComputeLayoutBuilder::new("Ocean Evolve Layout")
            .uniform(false)
            .texture(TextureViewDimension::D2Array)
            .storage_texture(TextureViewDimension::D2Array)
            .build(device);
        let fft_layout = ComputeLayoutBuilder::new("Ocean FFT Layout")
            .uniform(true)
            .texture(TextureViewDimension::D2)
            .texture(TextureViewDimension::D2Array)
            .storage_texture(TextureViewDimension::D2Array)
            .build(device);
        let post_layout = ComputeLayoutBuilder::new("Ocean Post Layout")
            .uniform(false)
            .texture(TextureViewDimension::D2Array)
            .storage_texture(TextureViewDimension::D2Array)
            .build(device);

        let evolve_module = recovery.create_shader(
            "time_spectrum.wgsl",
            include_str!("../shaders/compute/time_spectrum.wgsl"),
        )?;
        let fft_module = recovery.create_shader(
            "butterfly_fft.wgsl",
            include_str!("../shaders/compute/butterfly_fft.wgsl"),
        )?;
        let post_module = recovery.create_shader(
            "post_fft.wgsl",
            include_str!("../shaders/compute/post_fft.wgsl"),
        )?;

        let programs = FieldPrograms {
            evolve: recovery.create_compute_pipeline(
                "Ocean Evolve Spectrum",
                &[&evolve_layout],
                &evolve_module,
                "evolve_spectrum",
            )?,
            horizontal: recovery.create_compute_pipeline(
                "Ocean Horizontal FFT",
                &[&fft_layout],
                &fft_module,
                "horizontal_pass",
            )?,
            vertical: recovery.create_compute_pipeline(
                "Ocean Vertical FFT",
                &[&fft_layout],
                &fft_module,
                "vertical_pass",
            )?,
            post: recovery.create_compute_pipeline(
                "Ocean Post Process",
                &[&post_layout],
                &post_module,
                "post_process",
            )?,
        };

        let fft_binding = wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &fft_uniform,
            offset: 0,
            size: NonZeroU64::new(entry_size),
        });
        let fft_bind_group = |label: &str, read: &FloatTexture, write: &FloatTexture| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &fft_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: fft_binding.clone(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&butterfly.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&read.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&write.view),
                    },
                ],
            })
        };
        let fft = [
            fft_bind_group("Ocean FFT Spectrum -> Ping-Pong", &sets[0], &sets[1]),
            fft_bind_group("Ocean FFT Ping-Pong -> Spectrum", &sets[1], &sets[0]),
        ];

        let evolve = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ocean Evolve Bind Group"),
            layout: &evolve_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&h0.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&sets[0].view),
                },
            ],
        });

        let post = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ocean Post Bind Group"),
            layout: &post_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(
                        &sets[transform_output_set(stages)].view,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&data_maps.view),
                },
            ],
        });

        Ok(Self {
            params,
            time: 0.0,
            h0,
            butterfly,
            sets,
            shared: Arc::new(FieldShared { data_maps, uniform }),
            programs,
            bind_groups: FieldBindGroups { evolve, fft, post },
            fft_uniform,
            fft_stride,
            gpu,
        })
    }

    pub fn params(&self) -> &OceanFieldParams {
        &self.params
    }

    /// Time of the last update
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn gpu(&self) -> &Arc<GpuContext> {
        &self.gpu
    }

    /// Data maps for renderers: `2 * MAX_CASCADES` layers
    pub fn data_maps(&self) -> &FloatTexture {
        &self.shared.data_maps
    }

    pub(crate) fn shared(&self) -> &Arc<FieldShared> {
        &self.shared
    }

    pub(crate) fn h0(&self) -> &FloatTexture {
        &self.h0
    }

    pub(crate) fn set_params(&mut self, params: OceanFieldParams) {
        self.params = params;
        self.write_uniform();
    }

    fn write_uniform(&self) {
        let uniform = FieldUniform::from_params(&self.params, self.time);
        self.gpu
            .queue
            .write_buffer(&self.shared.uniform, 0, bytemuck::bytes_of(&uniform));
    }

    /// Recompute the data maps for `time` seconds
    ///
    /// Submits GPU work and returns without waiting for it.
    pub fn update(&mut self, time: f32) -> OceanResult<()> {
        self.gpu.ensure_alive("OceanField::update")?;
        self.time = time;
        self.write_uniform();

        let n = self.params.resolution;
        let stages = n.trailing_zeros();
        let groups = workgroup_count(n, WORKGROUP_SIZE_2D);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Ocean Field Update"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Ocean Evolve Spectrum"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.programs.evolve);
            pass.set_bind_group(0, &self.bind_groups.evolve, &[]);
            pass.dispatch_workgroups(groups, groups, 1);
        }

        for index in 0..2 * stages {
            let pipeline = if index < stages {
                &self.programs.horizontal
            } else {
                &self.programs.vertical
            };
            let offset = (index as u64 * self.fft_stride) as u32;

            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Ocean Butterfly Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.bind_groups.fft[(index % 2) as usize], &[offset]);
            pass.dispatch_workgroups(groups, groups, 1);
        }

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Ocean Post Process"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.programs.post);
            pass.set_bind_group(0, &self.bind_groups.post, &[]);
            pass.dispatch_workgroups(groups, groups, 1);
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        log::debug!("[OceanField::update] t={:.3} submitted {} passes", time, 2 * stages + 2);
        Ok(())
    }

    /// Replace the initial spectrum, e.g. with [`InitialSpectrum::monochromatic`]
    pub fn upload_initial_spectrum(&mut self, spectrum: &InitialSpectrum) -> OceanResult<()> {
        if spectrum.resolution() != self.params.resolution
            || spectrum.cascade_count() != self.params.cascades.len()
        {
            return Err(OceanError::invalid_config(
                "spectrum",
                format!("{}x{} cascades", spectrum.resolution(), spectrum.cascade_count()),
                format!(
                    "field expects resolution {} with {} cascades",
                    self.params.resolution,
                    self.params.cascades.len()
                ),
            ));
        }
        self.h0.upload(&self.gpu.queue, &spectrum.texture_data());
        Ok(())
    }

    /// Blocking readback of the data maps, per layer, row-major
    ///
    /// For tools and tests; never needed by the frame loop.
    pub fn download_data_maps(&self) -> OceanResult<Vec<Vec<Vec4>>> {
        let floats = self.shared.data_maps.download(&self.gpu)?;
        let texels = (self.params.resolution * self.params.resolution) as usize;
        Ok(floats
            .chunks(texels * 4)
            .map(|layer| layer.chunks(4).map(Vec4::from_slice).collect())
            .collect())
    }

    /// Sampler for `points_number` arbitrary xz positions
    pub fn create_points_sampler(&self, points_number: usize) -> OceanResult<PointsSampler> {
        PointsSampler::new(self, points_number)
    }

    /// Sampler for a `patch_resolution` x `patch_resolution` grid
    pub fn create_patch_sampler(&self, patch_resolution: u32) -> OceanResult<PatchSampler> {
        PatchSampler::new(self, patch_resolution)
    }

    /// Release the field's textures and programs
    ///
    /// Data maps held by live samplers are released when the last sampler
    /// drops.
    pub fn dispose(self) {
        log::info!(
            "[OceanField::dispose] releasing resolution {} field",
            self.params.resolution
        );
        self.h0.destroy();
        for set in &self.sets {
            set.destroy();
        }
        self.fft_uniform.destroy();
        match Arc::try_unwrap(self.shared) {
            Ok(shared) => {
                shared.data_maps.destroy();
                shared.uniform.destroy();
            }
            Err(_) => log::debug!("[OceanField::dispose] data maps still shared with samplers"),
        }
        // Butterfly texture belongs to the builder cache
        drop(self.butterfly);
    }
}

/// Ping-pong set holding the inverse-transform result after `2 * stages`
/// passes
pub fn transform_output_set(stages: u32) -> usize {
    ((2 * stages) % 2) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_map_arrays_are_padded() {
        assert_eq!(DATA_MAP_LAYERS, 6);
        assert_eq!(crate::gpu::allocated_layers(DATA_MAP_LAYERS), 7);
    }

    #[test]
    fn test_transform_lands_in_spectrum_set() {
        // An even pass count always ends where it started
        for stages in 1..=10 {
            assert_eq!(transform_output_set(stages), 0);
        }
    }
}
