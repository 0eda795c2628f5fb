//! Bind group layout construction for compute programs
//!
//! Bindings are numbered in declaration order, which must match the
//! `@binding(n)` order in the WGSL program.

use wgpu::{
    BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BufferBindingType, ShaderStages, StorageTextureAccess, TextureFormat, TextureSampleType,
    TextureViewDimension,
};

/// Sequential layout builder for one compute bind group
pub struct ComputeLayoutBuilder {
    label: &'static str,
    entries: Vec<BindGroupLayoutEntry>,
}

impl ComputeLayoutBuilder {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: Vec::new(),
        }
    }

    fn push(mut self, ty: BindingType) -> Self {
        let binding = self.entries.len() as u32;
        self.entries.push(BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::COMPUTE,
            ty,
            count: None,
        });
        self
    }

    pub fn uniform(self, has_dynamic_offset: bool) -> Self {
        self.push(BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset,
            min_binding_size: None,
        })
    }

    /// Unfilterable float texture read with `textureLoad`
    pub fn texture(self, view_dimension: TextureViewDimension) -> Self {
        self.push(BindingType::Texture {
            sample_type: TextureSampleType::Float { filterable: false },
            view_dimension,
            multisampled: false,
        })
    }

    /// Write-only `rgba32float` storage texture
    pub fn storage_texture(self, view_dimension: TextureViewDimension) -> Self {
        self.push(BindingType::StorageTexture {
            access: StorageTextureAccess::WriteOnly,
            format: TextureFormat::Rgba32Float,
            view_dimension,
        })
    }

    pub fn storage_buffer(self, read_only: bool) -> Self {
        self.push(BindingType::Buffer {
            ty: BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        })
    }

    pub fn entries(&self) -> &[BindGroupLayoutEntry] {
        &self.entries
    }

    pub fn build(self, device: &wgpu::Device) -> BindGroupLayout {
        device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some(self.label),
            entries: &self.entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_are_sequential() {
        let builder = ComputeLayoutBuilder::new("test")
            .uniform(true)
            .texture(TextureViewDimension::D2)
            .texture(TextureViewDimension::D2Array)
            .storage_texture(TextureViewDimension::D2Array);

        let bindings: Vec<u32> = builder.entries().iter().map(|e| e.binding).collect();
        assert_eq!(bindings, vec![0, 1, 2, 3]);
        assert!(builder
            .entries()
            .iter()
            .all(|e| e.visibility == ShaderStages::COMPUTE));

        match builder.entries()[0].ty {
            BindingType::Buffer {
                has_dynamic_offset, ..
            } => assert!(has_dynamic_offset),
            other => panic!("unexpected binding type {:?}", other),
        }
    }
}
