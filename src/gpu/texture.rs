//! Floating-point 2D textures and texture arrays

use super::context::GpuContext;
use crate::error::{ErrorContext, OceanError, OceanResult};

/// Channel count of a 32-bit float texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureChannels {
    R,
    Rg,
    Rgba,
}

impl TextureChannels {
    /// 1, 2, 3 or 4 channels; three channels are stored as RGBA since
    /// there is no 3-channel float format
    pub fn from_count(count: u32) -> OceanResult<Self> {
        match count {
            1 => Ok(Self::R),
            2 => Ok(Self::Rg),
            3 | 4 => Ok(Self::Rgba),
            _ => Err(OceanError::invalid_config(
                "channels",
                count,
                "float textures have 1 to 4 channels",
            )),
        }
    }

    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            Self::R => wgpu::TextureFormat::R32Float,
            Self::Rg => wgpu::TextureFormat::Rg32Float,
            Self::Rgba => wgpu::TextureFormat::Rgba32Float,
        }
    }

    pub fn count(self) -> u32 {
        match self {
            Self::R => 1,
            Self::Rg => 2,
            Self::Rgba => 4,
        }
    }
}

/// Pure function - layers to allocate for `layers` usable array layers
///
/// The GL backend has no texture views and infers the view dimension from
/// the layer count: 6 layers mean `Cube`, multiples of 6 mean `CubeArray`.
/// Arrays are padded by one layer so they always bind as `D2Array`.
pub fn allocated_layers(layers: u32) -> u32 {
    if layers > 1 && layers % 6 == 0 {
        layers + 1
    } else {
        layers
    }
}

/// Texture plus its default view
///
/// Textures with more than one layer get a `D2Array` view covering every
/// allocated layer; single-layer textures get a plain `D2` view. Uploads
/// and downloads only touch the first `layers` layers.
pub struct FloatTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub channels: TextureChannels,
}

impl FloatTexture {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        layers: u32,
        channels: TextureChannels,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: allocated_layers(layers),
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: channels.format(),
            usage,
            view_formats: &[],
        });

        let dimension = if layers > 1 {
            wgpu::TextureViewDimension::D2Array
        } else {
            wgpu::TextureViewDimension::D2
        };
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(dimension),
            ..Default::default()
        });

        Self {
            texture,
            view,
            width,
            height,
            layers,
            channels,
        }
    }

    /// Render target for compute passes: sampled, written as storage, and
    /// copyable both ways
    pub fn storage(
        device: &wgpu::Device,
        label: &str,
        resolution: u32,
        layers: u32,
    ) -> Self {
        Self::new(
            device,
            label,
            resolution,
            resolution,
            layers,
            TextureChannels::Rgba,
            wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
        )
    }

    pub fn bytes_per_texel(&self) -> u32 {
        self.channels.count() * 4
    }

    /// Write every layer; `data` is layer-major, then row-major
    pub fn upload<T: bytemuck::Pod>(&self, queue: &wgpu::Queue, data: &[T]) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(data),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.width * self.bytes_per_texel()),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: self.layers,
            },
        );
    }

    /// Blocking readback of every layer as tightly packed floats
    pub fn download(&self, gpu: &GpuContext) -> OceanResult<Vec<f32>> {
        gpu.ensure_alive("texture download")?;

        let row_bytes = self.width * self.bytes_per_texel();
        let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row_bytes = row_bytes.div_ceil(alignment) * alignment;
        let size = padded_row_bytes as u64 * self.height as u64 * self.layers as u64;

        let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Texture Download"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Texture Download"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: self.layers,
            },
        );
        gpu.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = flume::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .gpu_context("texture download recv")?
            .gpu_context("texture download map_async")?;

        let data = slice.get_mapped_range();
        let mut floats = Vec::with_capacity((row_bytes / 4 * self.height * self.layers) as usize);
        for row in data.chunks(padded_row_bytes as usize) {
            floats.extend_from_slice(bytemuck::cast_slice::<u8, f32>(&row[..row_bytes as usize]));
        }
        drop(data);
        staging.unmap();

        Ok(floats)
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}
