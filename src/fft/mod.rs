//! CPU Fourier transforms
//!
//! The butterfly table here is the same one the GPU passes read, so these
//! routines double as the reference for the GPU inverse transform.

pub mod butterfly;

pub use butterfly::{reverse_bits, ButterflyEntry, ButterflyTable};
pub use rustfft::num_complex::Complex32;

use std::f64::consts::PI;

use crate::error::OceanResult;

/// Sign of the exponent in the transform kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `exp(-2*pi*i*jk/N)`
    Forward,
    /// `exp(+2*pi*i*jk/N)`, unnormalized
    Inverse,
}

/// One butterfly: `p + w * q`
#[inline]
pub fn butterfly(w: Complex32, p: Complex32, q: Complex32) -> Complex32 {
    p + w * q
}

/// Unnormalized in-order transform of `data` (length = table resolution)
pub fn transform(table: &ButterflyTable, data: &mut [Complex32], direction: Direction) {
    let n = table.resolution() as usize;
    debug_assert_eq!(data.len(), n);

    let mut source = data.to_vec();
    let mut target = vec![Complex32::new(0.0, 0.0); n];
    for stage in 0..table.stages() {
        for (index, out) in target.iter_mut().enumerate() {
            let entry = table.entry(stage, index as u32);
            let w = match direction {
                Direction::Forward => entry.twiddle.conj(),
                Direction::Inverse => entry.twiddle,
            };
            *out = butterfly(w, source[entry.a as usize], source[entry.b as usize]);
        }
        std::mem::swap(&mut source, &mut target);
    }
    data.copy_from_slice(&source);
}

/// Forward FFT in place (unnormalized)
pub fn fft(data: &mut [Complex32]) -> OceanResult<()> {
    let table = ButterflyTable::new(data.len() as u32)?;
    transform(&table, data, Direction::Forward);
    Ok(())
}

/// Inverse FFT in place, normalized by `1/N`
pub fn ifft(data: &mut [Complex32]) -> OceanResult<()> {
    let table = ButterflyTable::new(data.len() as u32)?;
    transform(&table, data, Direction::Inverse);
    let scale = 1.0 / data.len() as f32;
    data.iter_mut().for_each(|v| *v *= scale);
    Ok(())
}

/// Forward 2D FFT of a row-major `n x n` grid (unnormalized)
pub fn fft2(data: &mut [Complex32], n: usize) -> OceanResult<()> {
    let table = ButterflyTable::new(n as u32)?;
    transform_2d(&table, data, Direction::Forward);
    Ok(())
}

/// Inverse 2D FFT of a row-major `n x n` grid, normalized by `1/N^2`
pub fn ifft2(data: &mut [Complex32], n: usize) -> OceanResult<()> {
    let table = ButterflyTable::new(n as u32)?;
    transform_2d(&table, data, Direction::Inverse);
    let scale = 1.0 / (n * n) as f32;
    data.iter_mut().for_each(|v| *v *= scale);
    Ok(())
}

/// Rows first, then columns
pub fn transform_2d(table: &ButterflyTable, data: &mut [Complex32], direction: Direction) {
    let n = table.resolution() as usize;
    debug_assert_eq!(data.len(), n * n);

    for row in data.chunks_mut(n) {
        transform(table, row, direction);
    }

    let mut column = vec![Complex32::new(0.0, 0.0); n];
    for x in 0..n {
        for y in 0..n {
            column[y] = data[y * n + x];
        }
        transform(table, &mut column, direction);
        for y in 0..n {
            data[y * n + x] = column[y];
        }
    }
}

/// Naive O(N^2) forward DFT
pub fn dft(input: &[Complex32]) -> Vec<Complex32> {
    naive_transform(input, -1.0)
}

/// Naive O(N^2) inverse DFT, normalized by `1/N`
pub fn idft(input: &[Complex32]) -> Vec<Complex32> {
    let scale = 1.0 / input.len().max(1) as f32;
    naive_transform(input, 1.0)
        .into_iter()
        .map(|v| v * scale)
        .collect()
}

fn naive_transform(input: &[Complex32], sign: f64) -> Vec<Complex32> {
    let n = input.len();
    (0..n)
        .map(|k| {
            let (mut re, mut im) = (0.0f64, 0.0f64);
            for (j, x) in input.iter().enumerate() {
                let angle = sign * 2.0 * PI * ((j * k) % n) as f64 / n as f64;
                let (s, c) = angle.sin_cos();
                re += x.re as f64 * c - x.im as f64 * s;
                im += x.re as f64 * s + x.im as f64 * c;
            }
            Complex32::new(re as f32, im as f32)
        })
        .collect()
}
