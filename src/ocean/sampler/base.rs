//! Shared GPU machinery of the points and patch samplers
//!
//! A sampler owns a query buffer of xz positions, an output buffer of
//! `vec4` results and the sampling program. Each sample dispatches the
//! program, copies the results into a staging buffer owned by the returned
//! [`Sample`], and maps it asynchronously.

use std::sync::Arc;
use std::time::Duration;

use glam::{Vec2, Vec3};
use wgpu::TextureViewDimension;

use super::sample::{Sample, DEFAULT_SAMPLE_LIFETIME};
use crate::error::OceanResult;
use crate::gpu::{
    map_read_sample, workgroup_count, ComputeLayoutBuilder, GpuContext, WORKGROUP_SIZE_1D,
};
use crate::ocean::field::{FieldShared, OceanField};
use crate::ocean::gpu_types::SamplerUniform;

const QUERY_STRIDE: u64 = std::mem::size_of::<[f32; 2]>() as u64;
const SAMPLE_STRIDE: u64 = std::mem::size_of::<[f32; 4]>() as u64;

struct SamplerBuffers {
    queries: wgpu::Buffer,
    samples: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub(crate) struct SamplerCore {
    label: &'static str,
    gpu: Arc<GpuContext>,
    shared: Arc<FieldShared>,
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
    uniform: wgpu::Buffer,
    buffers: SamplerBuffers,
    capacity: usize,
    lifetime: Duration,
}

impl SamplerCore {
    pub(crate) fn new(field: &OceanField, capacity: usize, label: &'static str) -> OceanResult<Self> {
        let gpu = field.gpu().clone();
        gpu.ensure_alive(label)?;
        let device = &gpu.device;

        let layout = ComputeLayoutBuilder::new("Ocean Sampler Layout")
            .uniform(false)
            .uniform(false)
            .texture(TextureViewDimension::D2Array)
            .storage_buffer(true)
            .storage_buffer(false)
            .build(device);

        let recovery = gpu.recovery();
        let module = recovery.create_shader(
            "surface_sampler.wgsl",
            include_str!("../../shaders/compute/surface_sampler.wgsl"),
        )?;
        let pipeline =
            recovery.create_compute_pipeline(label, &[&layout], &module, "sample_surface")?;

        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ocean Sampler Uniform"),
            size: std::mem::size_of::<SamplerUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shared = field.shared().clone();
        let buffers = create_buffers(device, &layout, &uniform, &shared, capacity);
        log::debug!("[SamplerCore::new] {} with capacity {}", label, capacity);

        Ok(Self {
            label,
            shared,
            layout,
            pipeline,
            uniform,
            buffers,
            capacity,
            lifetime: DEFAULT_SAMPLE_LIFETIME,
            gpu,
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub(crate) fn set_lifetime(&mut self, lifetime: Duration) {
        self.lifetime = lifetime;
    }

    /// Recreate the query and output buffers for `capacity` points
    pub(crate) fn resize(&mut self, capacity: usize) {
        self.buffers.queries.destroy();
        self.buffers.samples.destroy();
        self.buffers = create_buffers(
            &self.gpu.device,
            &self.layout,
            &self.uniform,
            &self.shared,
            capacity,
        );
        self.capacity = capacity;
        log::debug!("[SamplerCore::resize] {} to {} points", self.label, capacity);
    }

    pub(crate) fn write_queries(&self, points: &[Vec2]) {
        let data: Vec<[f32; 2]> = points.iter().map(|p| p.to_array()).collect();
        self.gpu
            .queue
            .write_buffer(&self.buffers.queries, 0, bytemuck::cast_slice(&data));
    }

    /// Sample the first `count` queries, placed at `origin + query * size`
    pub(crate) fn dispatch(
        &self,
        origin: Vec2,
        size: f32,
        count: usize,
    ) -> OceanResult<Sample<Vec<Vec3>>> {
        self.gpu.ensure_alive(self.label)?;
        if count == 0 {
            return Ok(Sample::ready(Vec::new()));
        }

        let uniform = SamplerUniform {
            origin: origin.to_array(),
            size,
            count: count as u32,
        };
        self.gpu
            .queue
            .write_buffer(&self.uniform, 0, bytemuck::bytes_of(&uniform));

        let bytes = count as u64 * SAMPLE_STRIDE;
        let staging = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ocean Sample Readback"),
            size: bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(self.label),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(self.label),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.buffers.bind_group, &[]);
            pass.dispatch_workgroups(workgroup_count(count as u32, WORKGROUP_SIZE_1D), 1, 1);
        }
        encoder.copy_buffer_to_buffer(&self.buffers.samples, 0, &staging, 0, bytes);
        self.gpu.queue.submit(Some(encoder.finish()));

        log::debug!("[SamplerCore::dispatch] {} issued {} points", self.label, count);
        Ok(map_read_sample(
            self.gpu.device.clone(),
            staging,
            self.lifetime,
            |bytes| {
                bytemuck::cast_slice::<u8, [f32; 4]>(bytes)
                    .iter()
                    .map(|s| Vec3::new(s[0], s[1], s[2]))
                    .collect()
            },
        ))
    }
}

fn create_buffers(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform: &wgpu::Buffer,
    shared: &FieldShared,
    capacity: usize,
) -> SamplerBuffers {
    // Zero-sized storage bindings are invalid
    let slots = capacity.max(1) as u64;

    let queries = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Ocean Sampler Queries"),
        size: slots * QUERY_STRIDE,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let samples = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Ocean Sampler Output"),
        size: slots * SAMPLE_STRIDE,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Ocean Sampler Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: shared.uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&shared.data_maps.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: queries.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: samples.as_entire_binding(),
            },
        ],
    });

    SamplerBuffers {
        queries,
        samples,
        bind_group,
    }
}
