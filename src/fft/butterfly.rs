//! Radix-2 butterfly lookup table
//!
//! One entry per `(stage, index)` for a decimation-in-time transform of
//! length `N`: the twiddle factor and the two source indices combined at
//! that position. Stage 0 reads bit-reversed inputs, so the table drives
//! an in-order transform through ping-pong buffers with no separate
//! reordering pass. The same entries are uploaded as a `log2(N) x N`
//! RGBA texture for the GPU passes.

use std::f64::consts::PI;

use super::Complex32;
use crate::error::{OceanError, OceanResult};

/// Twiddle and source indices for one output element of one stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButterflyEntry {
    /// `exp(+2*pi*i*k/N)`; conjugate it for a forward transform
    pub twiddle: Complex32,
    pub a: u32,
    pub b: u32,
}

/// Butterfly entries for every stage of a length-`N` transform
#[derive(Debug, Clone)]
pub struct ButterflyTable {
    resolution: u32,
    stages: u32,
    // stage-major: entries[stage * N + index]
    entries: Vec<ButterflyEntry>,
}

impl ButterflyTable {
    /// Build the table for a power-of-two `resolution` (at least 2)
    pub fn new(resolution: u32) -> OceanResult<Self> {
        if resolution < 2 || !resolution.is_power_of_two() {
            return Err(OceanError::invalid_config(
                "resolution",
                resolution,
                "butterfly table needs a power of two >= 2",
            ));
        }

        let n = resolution;
        let stages = n.trailing_zeros();
        let mut entries = Vec::with_capacity((stages * n) as usize);

        for stage in 0..stages {
            let span = 1u32 << stage;
            for index in 0..n {
                let k = (index * (n >> (stage + 1))) % n;
                let angle = 2.0 * PI * k as f64 / n as f64;
                let twiddle = Complex32::new(angle.cos() as f32, angle.sin() as f32);

                let top_wing = index % (2 * span) < span;
                let (a, b) = match (stage, top_wing) {
                    (0, true) => (reverse_bits(index, stages), reverse_bits(index + 1, stages)),
                    (0, false) => (reverse_bits(index - 1, stages), reverse_bits(index, stages)),
                    (_, true) => (index, index + span),
                    (_, false) => (index - span, index),
                };

                entries.push(ButterflyEntry { twiddle, a, b });
            }
        }

        Ok(Self {
            resolution,
            stages,
            entries,
        })
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// `log2(N)`
    pub fn stages(&self) -> u32 {
        self.stages
    }

    pub fn entry(&self, stage: u32, index: u32) -> ButterflyEntry {
        self.entries[(stage * self.resolution + index) as usize]
    }

    /// Texture payload: width `stages`, height `N`, texel `(re, im, a, b)`
    pub fn texels(&self) -> Vec<[f32; 4]> {
        let mut texels = Vec::with_capacity(self.entries.len());
        for index in 0..self.resolution {
            for stage in 0..self.stages {
                let e = self.entry(stage, index);
                texels.push([e.twiddle.re, e.twiddle.im, e.a as f32, e.b as f32]);
            }
        }
        texels
    }
}

/// Reverse the low `bits` bits of `value`
pub fn reverse_bits(value: u32, bits: u32) -> u32 {
    if bits == 0 {
        return 0;
    }
    value.reverse_bits() >> (32 - bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_bits() {
        assert_eq!(reverse_bits(1, 3), 4);
        assert_eq!(reverse_bits(6, 3), 3);
        assert_eq!(reverse_bits(0, 3), 0);
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(ButterflyTable::new(12).is_err());
        assert!(ButterflyTable::new(1).is_err());
        assert!(ButterflyTable::new(0).is_err());
    }

    #[test]
    fn test_first_stage_pairs_bit_reversed_inputs() {
        let table = ButterflyTable::new(4).unwrap();
        assert_eq!(table.stages(), 2);

        let top = table.entry(0, 0);
        let bottom = table.entry(0, 1);
        assert_eq!((top.a, top.b), (0, 2));
        assert_eq!((bottom.a, bottom.b), (0, 2));
        assert!((top.twiddle.re - 1.0).abs() < 1e-6);
        assert!((bottom.twiddle.re + 1.0).abs() < 1e-6);

        let last = table.entry(1, 3);
        assert_eq!((last.a, last.b), (1, 3));
        // exp(3*pi*i/2) = -i
        assert!((last.twiddle.im + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_texel_layout() {
        let table = ButterflyTable::new(8).unwrap();
        let texels = table.texels();
        assert_eq!(texels.len(), 3 * 8);
        // Row 5, stage 2
        let e = table.entry(2, 5);
        assert_eq!(texels[5 * 3 + 2], [e.twiddle.re, e.twiddle.im, e.a as f32, e.b as f32]);
    }
}
