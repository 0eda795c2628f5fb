//! CPU Ocean Field Data - Pure DOP
//!
//! Plain data shared by the CPU field, its samplers and the operations in
//! cpu_field_operations.rs.

use glam::Vec4;

/// Data maps of a CPU field, two packed layers per cascade
///
/// Layer `2c` = (dx, height, dz, dxdz), layer `2c+1` =
/// (dh/dx, dh/dz, dxdx, dzdz); texel `(x, y)` sits at world
/// `(x, y) * size / N`.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuDataMaps {
    pub(crate) resolution: u32,
    /// Tile size per cascade, metres
    pub(crate) sizes: Vec<f32>,
    pub(crate) croppinesses: Vec<f32>,
    /// `2 * cascades` layers of `resolution^2` texels, row-major
    pub(crate) layers: Vec<Vec<Vec4>>,
}

impl CpuDataMaps {
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn cascade_count(&self) -> usize {
        self.sizes.len()
    }

    pub fn layers(&self) -> &[Vec<Vec4>] {
        &self.layers
    }
}

/// Direction of one butterfly pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Along rows
    Horizontal,
    /// Along columns
    Vertical,
}
