//! CPU Ocean Field Operations - Pure DOP Functions
//!
//! Every stage of the CPU field and every read of its data maps, as free
//! functions over the data in cpu_field_data.rs.

use glam::{Vec2, Vec3, Vec4};
use rayon::prelude::*;

use super::cpu_field_data::{Axis, CpuDataMaps};
use super::params::OceanFieldParams;
use super::spectrum::{evolve_texel, wave_vector, InitialSpectrum};
use crate::fft::{ButterflyTable, Complex32};

/// Fixed-point steps used to undo choppy horizontal displacement
pub const INVERSION_STEPS: usize = 4;

/// Zeroed maps sized for `params`
pub fn flat_maps(params: &OceanFieldParams) -> CpuDataMaps {
    let texels = (params.resolution * params.resolution) as usize;
    CpuDataMaps {
        resolution: params.resolution,
        sizes: params.cascades.iter().map(|c| c.size).collect(),
        croppinesses: params.cascades.iter().map(|c| c.croppiness).collect(),
        layers: vec![vec![Vec4::ZERO; texels]; 2 * params.cascades.len()],
    }
}

/// Pure function - texel with periodic wrapping
pub fn texel(maps: &CpuDataMaps, layer: usize, x: i32, y: i32) -> Vec4 {
    let n = maps.resolution as i32;
    let (x, y) = (x.rem_euclid(n), y.rem_euclid(n));
    maps.layers[layer][(y * n + x) as usize]
}

/// Pure function - periodic bilinear filter; `uv` in tiles
pub fn bilinear(maps: &CpuDataMaps, layer: usize, uv: Vec2) -> Vec4 {
    let f = uv * maps.resolution as f32;
    let base = f.floor();
    let t = f - base;
    let (x, y) = (base.x as i32, base.y as i32);

    let a = texel(maps, layer, x, y);
    let b = texel(maps, layer, x + 1, y);
    let c = texel(maps, layer, x, y + 1);
    let d = texel(maps, layer, x + 1, y + 1);
    a.lerp(b, t.x).lerp(c.lerp(d, t.x), t.y)
}

/// Summed cascade displacement at the undisplaced position `xz`
pub fn displacement(maps: &CpuDataMaps, xz: Vec2) -> Vec3 {
    maps.sizes
        .iter()
        .zip(&maps.croppinesses)
        .enumerate()
        .map(|(c, (size, crop))| {
            let value = bilinear(maps, 2 * c, xz / *size);
            Vec3::new(value.x * crop, value.y, value.z * crop)
        })
        .sum()
}

/// `(x, height, z)` of the surface point whose displacement lands on `xz`
pub fn surface_point(maps: &CpuDataMaps, xz: Vec2) -> Vec3 {
    let mut p = xz;
    for _ in 0..INVERSION_STEPS {
        let d = displacement(maps, p);
        p = xz - Vec2::new(d.x, d.z);
    }
    Vec3::new(xz.x, displacement(maps, p).y, xz.y)
}

/// Time spectrum stage: two packed layers per cascade at `time`
pub fn evolve_cascades(
    params: &OceanFieldParams,
    spectrum: &InitialSpectrum,
    time: f32,
) -> Vec<Vec<Vec4>> {
    let n = params.resolution as usize;
    let mut layers = Vec::with_capacity(2 * params.cascades.len());
    for (c, cascade) in params.cascades.iter().enumerate() {
        let h0 = spectrum.layer(c);
        let mut first = vec![Vec4::ZERO; n * n];
        let mut second = vec![Vec4::ZERO; n * n];
        first
            .par_chunks_mut(n)
            .zip(second.par_chunks_mut(n))
            .enumerate()
            .for_each(|(y, (row_a, row_b))| {
                for x in 0..n {
                    let k = wave_vector(x as u32, y as u32, n as u32, cascade.size);
                    let [a, b] = evolve_texel(h0[y * n + x], k, time);
                    row_a[x] = a;
                    row_b[x] = b;
                }
            });
        layers.push(first);
        layers.push(second);
    }
    layers
}

/// Horizontal then vertical butterfly passes, then post-process, in place
pub fn inverse_transform(table: &ButterflyTable, layer: &mut Vec<Vec4>) {
    let n = table.resolution() as usize;
    let stages = table.stages();
    let mut scratch = vec![Vec4::ZERO; n * n];
    for index in 0..2 * stages {
        let axis = if index < stages { Axis::Horizontal } else { Axis::Vertical };
        butterfly_pass(table, index % stages, axis, layer, &mut scratch);
        std::mem::swap(layer, &mut scratch);
    }
    post_process(layer, n, 1.0 / (n * n) as f32);
}

fn cmul(w: Complex32, re: f32, im: f32) -> Complex32 {
    w * Complex32::new(re, im)
}

/// Pure function - one radix-2 stage over both packed complex values
pub fn butterfly_pass(
    table: &ButterflyTable,
    stage: u32,
    axis: Axis,
    src: &[Vec4],
    dst: &mut [Vec4],
) {
    let n = table.resolution() as usize;
    dst.par_chunks_mut(n).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let (entry, p, q) = match axis {
                Axis::Horizontal => {
                    let entry = table.entry(stage, x as u32);
                    (entry, src[y * n + entry.a as usize], src[y * n + entry.b as usize])
                }
                Axis::Vertical => {
                    let entry = table.entry(stage, y as u32);
                    (entry, src[entry.a as usize * n + x], src[entry.b as usize * n + x])
                }
            };
            let first = cmul(entry.twiddle, q.x, q.y);
            let second = cmul(entry.twiddle, q.z, q.w);
            *out = Vec4::new(
                p.x + first.re,
                p.y + first.im,
                p.z + second.re,
                p.w + second.im,
            );
        }
    });
}

/// Pure function - undo the centred-spectrum sign pattern and normalise
pub fn post_process(layer: &mut [Vec4], n: usize, scale: f32) {
    layer.par_chunks_mut(n).enumerate().for_each(|(y, row)| {
        for (x, value) in row.iter_mut().enumerate() {
            let parity = if (x + y) % 2 == 1 { -1.0 } else { 1.0 };
            *value *= parity * scale;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_maps() -> CpuDataMaps {
        let params = OceanFieldParams {
            resolution: 4,
            ..OceanFieldParams::default()
        };
        let mut maps = flat_maps(&params);
        for (i, t) in maps.layers[0].iter_mut().enumerate() {
            *t = Vec4::splat(i as f32);
        }
        maps
    }

    #[test]
    fn test_flat_maps_layout() {
        let maps = flat_maps(&OceanFieldParams {
            resolution: 8,
            ..OceanFieldParams::default()
        });
        assert_eq!(maps.cascade_count(), 3);
        assert_eq!(maps.layers().len(), 6);
        assert!(maps.layers().iter().all(|l| l.len() == 64));
    }

    #[test]
    fn test_texel_wraps() {
        let maps = ramp_maps();
        assert_eq!(texel(&maps, 0, 1, 2).x, 9.0);
        assert_eq!(texel(&maps, 0, -1, 0).x, 3.0);
        assert_eq!(texel(&maps, 0, 4, 5).x, 4.0);
    }

    #[test]
    fn test_bilinear_midpoint() {
        let maps = ramp_maps();
        // Halfway between texels (0, 0) and (1, 0)
        let value = bilinear(&maps, 0, Vec2::new(0.125, 0.0));
        assert_eq!(value.x, 0.5);
        // Wraps from the last column back to the first
        let wrapped = bilinear(&maps, 0, Vec2::new(0.875, 0.0));
        assert_eq!(wrapped.x, 1.5);
    }

    #[test]
    fn test_post_process_sign_pattern() {
        let mut layer = vec![Vec4::ONE; 4];
        post_process(&mut layer, 2, 0.5);
        assert_eq!(layer[0], Vec4::splat(0.5));
        assert_eq!(layer[1], Vec4::splat(-0.5));
        assert_eq!(layer[2], Vec4::splat(-0.5));
        assert_eq!(layer[3], Vec4::splat(0.5));
    }
}
