//! Seeded white noise feeding the initial spectrum
//!
//! Two uniforms in `[0, 1)` per texel, consumed by Box-Muller to form one
//! complex Gaussian sample. The same buffer is uploaded to the GPU and used
//! by the CPU reference, so both produce identical spectra for a seed.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// `resolution * resolution` texels of `(u1, u2)`, row-major
pub fn white_noise(resolution: u32, seed: u64) -> Vec<[f32; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    let texels = (resolution as usize) * (resolution as usize);
    (0..texels).map(|_| [rng.gen::<f32>(), rng.gen::<f32>()]).collect()
}

/// Box-Muller transform of one noise texel into a standard complex Gaussian
pub fn gaussian_pair(uniforms: [f32; 2]) -> [f32; 2] {
    let radius = (-2.0 * uniforms[0].max(1.0e-6).ln()).sqrt();
    let theta = std::f32::consts::TAU * uniforms[1];
    [radius * theta.cos(), radius * theta.sin()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_is_reproducible() {
        assert_eq!(white_noise(16, 9), white_noise(16, 9));
        assert_ne!(white_noise(16, 9), white_noise(16, 10));
    }

    #[test]
    fn test_noise_range_and_len() {
        let noise = white_noise(8, 0);
        assert_eq!(noise.len(), 64);
        assert!(noise.iter().flatten().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_gaussian_statistics() {
        let noise = white_noise(128, 1);
        let samples: Vec<f32> = noise.iter().flat_map(|t| gaussian_pair(*t)).collect();
        let count = samples.len() as f32;
        let mean = samples.iter().sum::<f32>() / count;
        let variance = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f32>() / count;
        assert!(mean.abs() < 0.05, "mean {}", mean);
        assert!((variance - 1.0).abs() < 0.05, "variance {}", variance);
    }
}
