//! GPU ocean field builder
//!
//! Produces [`OceanField`]s and regenerates their initial spectrum when
//! parameters change. Butterfly and noise textures are cached per
//! resolution; they stay cached until evicted.

use std::sync::Arc;

use wgpu::TextureViewDimension;

use super::cache::ResolutionCache;
use super::field::OceanField;
use super::gpu_types::InitialSpectrumUniform;
use super::noise::white_noise;
use super::params::{OceanFieldOverrides, OceanFieldParams};
use crate::error::{OceanError, OceanResult};
use crate::fft::ButterflyTable;
use crate::gpu::{
    workgroup_count, ComputeLayoutBuilder, FloatTexture, GpuContext, TextureChannels,
    WORKGROUP_SIZE_2D,
};

pub struct OceanFieldBuilder {
    gpu: Arc<GpuContext>,
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
    uniform: wgpu::Buffer,
    butterflies: ResolutionCache<Arc<FloatTexture>>,
    noises: ResolutionCache<FloatTexture>,
}

impl OceanFieldBuilder {
    /// Compile the initial-spectrum program
    pub fn new(gpu: Arc<GpuContext>) -> OceanResult<Self> {
        gpu.ensure_alive("OceanFieldBuilder::new")?;
        log::info!("[OceanFieldBuilder::new] compiling initial spectrum program");

        let device = &gpu.device;
        let layout = ComputeLayoutBuilder::new("Ocean H0 Layout")
            .uniform(false)
            .texture(TextureViewDimension::D2)
            .storage_texture(TextureViewDimension::D2Array)
            .build(device);

        let recovery = gpu.recovery();
        let module = recovery.create_shader(
            "initial_spectrum.wgsl",
            include_str!("../shaders/compute/initial_spectrum.wgsl"),
        )?;
        let pipeline = recovery.create_compute_pipeline(
            "Ocean Initial Spectrum",
            &[&layout],
            &module,
            "generate_initial_spectrum",
        )?;

        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ocean H0 Uniform"),
            size: std::mem::size_of::<InitialSpectrumUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            layout,
            pipeline,
            uniform,
            butterflies: ResolutionCache::new("butterfly"),
            noises: ResolutionCache::new("noise"),
            gpu,
        })
    }

    pub fn gpu(&self) -> &Arc<GpuContext> {
        &self.gpu
    }

    /// Build a field from `overrides` merged over the defaults
    pub fn build(&mut self, overrides: impl Into<OceanFieldOverrides>) -> OceanResult<OceanField> {
        let params = overrides.into().apply_to(&OceanFieldParams::default());
        params.validate()?;
        log::info!(
            "[OceanFieldBuilder::build] resolution={} cascades={} seed={}",
            params.resolution,
            params.cascades.len(),
            params.random_seed
        );

        let butterfly = self.butterfly_texture(params.resolution)?;
        let field = OceanField::new(self.gpu.clone(), params, butterfly)?;
        self.generate_initial_spectrum(field.h0(), field.params())?;
        Ok(field)
    }

    /// Merge `overrides` over the field's current parameters and regenerate
    /// its initial spectrum
    ///
    /// The resolution is fixed for a field's lifetime; changing it requires
    /// a new build.
    pub fn update(
        &mut self,
        field: &mut OceanField,
        overrides: impl Into<OceanFieldOverrides>,
    ) -> OceanResult<()> {
        let params = overrides.into().apply_to(field.params());
        params.validate()?;
        if params.resolution != field.params().resolution {
            return Err(OceanError::invalid_config(
                "resolution",
                params.resolution,
                format!(
                    "field was built at {}; dispose it and build a new one",
                    field.params().resolution
                ),
            ));
        }

        self.generate_initial_spectrum(field.h0(), &params)?;
        field.set_params(params);
        log::info!("[OceanFieldBuilder::update] initial spectrum regenerated");
        Ok(())
    }

    /// Drop cached textures for `resolution`
    ///
    /// Noise textures are only used by the builder and are destroyed here.
    /// Butterfly textures are shared with fields and are released when the
    /// last field using them is disposed.
    pub fn evict(&mut self, resolution: u32) {
        self.butterflies.evict(resolution);
        if let Some(noise) = self.noises.evict(resolution) {
            noise.destroy();
        }
    }

    /// [`evict`](Self::evict) every resolution
    pub fn clear_cache(&mut self) {
        self.butterflies.clear();
        for noise in self.noises.drain() {
            noise.destroy();
        }
    }

    fn butterfly_texture(&mut self, resolution: u32) -> OceanResult<Arc<FloatTexture>> {
        let gpu = &self.gpu;
        let texture = self.butterflies.get_or_try_insert_with(resolution, || {
            let table = ButterflyTable::new(resolution)?;
            let texture = FloatTexture::new(
                &gpu.device,
                "Ocean Butterfly",
                table.stages(),
                resolution,
                1,
                TextureChannels::Rgba,
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            );
            texture.upload(&gpu.queue, &table.texels());
            Ok::<_, OceanError>(Arc::new(texture))
        })?;
        Ok(texture.clone())
    }

    fn generate_initial_spectrum(
        &mut self,
        h0: &FloatTexture,
        params: &OceanFieldParams,
    ) -> OceanResult<()> {
        self.gpu.ensure_alive("OceanFieldBuilder::generate_initial_spectrum")?;
        let n = params.resolution;
        let gpu = &self.gpu;

        let noise = self.noises.get_or_try_insert_with(n, || {
            Ok::<_, OceanError>(FloatTexture::new(
                &gpu.device,
                "Ocean Noise",
                n,
                n,
                1,
                TextureChannels::Rg,
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            ))
        })?;
        noise.upload(&gpu.queue, &white_noise(n, params.random_seed));

        let uniform = InitialSpectrumUniform::from_params(params);
        gpu.queue
            .write_buffer(&self.uniform, 0, bytemuck::bytes_of(&uniform));

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ocean H0 Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&noise.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&h0.view),
                },
            ],
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Ocean Initial Spectrum"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Ocean Initial Spectrum"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            let groups = workgroup_count(n, WORKGROUP_SIZE_2D);
            pass.dispatch_workgroups(groups, groups, 1);
        }
        gpu.queue.submit(Some(encoder.finish()));

        log::debug!(
            "[OceanFieldBuilder::generate_initial_spectrum] resolution={} seed={}",
            n,
            params.random_seed
        );
        Ok(())
    }
}
