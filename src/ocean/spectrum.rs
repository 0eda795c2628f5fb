//! Wave spectrum math
//!
//! CPU twins of the initial-spectrum and time-evolution compute programs.
//! The WGSL in `shaders/compute` follows these functions line for line.

use glam::{IVec2, Vec2, Vec4};

use super::noise::{gaussian_pair, white_noise};
use super::params::{Cascade, OceanFieldParams, MAX_CASCADES};
use crate::error::{OceanError, OceanResult};
use crate::fft::Complex32;

/// Gravitational acceleration used by the dispersion relation
pub const GRAVITY: f32 = 9.81;

/// Wave vector of texel `(x, y)` for a tile of `size` metres
///
/// Texels are centred: `(x, y) = (N/2, N/2)` is `k = 0`.
pub fn wave_vector(x: u32, y: u32, resolution: u32, size: f32) -> Vec2 {
    let half = (resolution / 2) as i32;
    let n = Vec2::new((x as i32 - half) as f32, (y as i32 - half) as f32);
    n * std::f32::consts::TAU / size
}

/// Deep-water dispersion `omega = sqrt(g |k|)`
pub fn dispersion(k_len: f32) -> f32 {
    (GRAVITY * k_len).sqrt()
}

/// Phillips spectrum with a directional factor and small-wave suppression
pub fn phillips(k: Vec2, wind: Vec2, alignment: f32, cascade: &Cascade) -> f32 {
    let k_len = k.length();
    if k_len < 1.0e-6 || k_len < cascade.min_k() || k_len > cascade.max_k() {
        return 0.0;
    }
    let wind_speed = wind.length();
    if wind_speed < 1.0e-6 {
        return 0.0;
    }

    let l = wind_speed * wind_speed / GRAVITY;
    let k2 = k_len * k_len;
    let direction = (k / k_len).dot(wind / wind_speed).abs();
    let mut aligned = 1.0;
    if alignment > 0.0 {
        aligned = if direction > 0.0 { direction.powf(alignment) } else { 0.0 };
    }
    let suppress = (-k2 * (l * 0.001) * (l * 0.001)).exp();

    cascade.spectrum_strength() * (-1.0 / (k2 * l * l)).exp() / (k2 * k2) * aligned * suppress
}

/// Time-evolved spectra of one cascade texel, packed two complex values per
/// `Vec4`:
/// `[ (Dx + i*H, Dz + i*Dxz), (dH/dx + i*dH/dz, Dxx + i*Dzz) ]`
///
/// `h0` is the initial-spectrum texel `(h0(k), conj(h0(-k)))`.
pub fn evolve_texel(h0: Vec4, k: Vec2, time: f32) -> [Vec4; 2] {
    let k_len = k.length();
    let phase = Complex32::from_polar(1.0, dispersion(k_len) * time);
    let h = Complex32::new(h0.x, h0.y) * phase.conj() + Complex32::new(h0.z, h0.w) * phase;

    let inv_len = if k_len > 1.0e-6 { 1.0 / k_len } else { 0.0 };
    let i = Complex32::i();

    let dx = -i * h * (k.x * inv_len);
    let dz = -i * h * (k.y * inv_len);
    let dxdz = h * (k.x * k.y * inv_len);
    let dydx = i * h * k.x;
    let dydz = i * h * k.y;
    let dxdx = h * (k.x * k.x * inv_len);
    let dzdz = h * (k.y * k.y * inv_len);

    [
        pack(dx + i * h, dz + i * dxdz),
        pack(dydx + i * dydz, dxdx + i * dzdz),
    ]
}

fn pack(a: Complex32, b: Complex32) -> Vec4 {
    Vec4::new(a.re, a.im, b.re, b.im)
}

/// Per-cascade initial spectrum `h0`, texel layout `(h0(k), conj(h0(-k)))`
///
/// Amplitudes include an `N^2` factor that cancels the `1/N^2` applied
/// after the inverse transform, so data maps come out in metres.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialSpectrum {
    resolution: u32,
    layers: Vec<Vec<Vec4>>,
}

impl InitialSpectrum {
    /// Deterministic spectrum for `params` (seeded noise)
    pub fn generate(params: &OceanFieldParams) -> Self {
        let noise = white_noise(params.resolution, params.random_seed);
        Self::from_noise(params, &noise)
    }

    /// Spectrum from an explicit noise buffer of `N*N` texels
    pub fn from_noise(params: &OceanFieldParams, noise: &[[f32; 2]]) -> Self {
        let n = params.resolution;
        let n2 = (n * n) as f32;

        let layers = params
            .cascades
            .iter()
            .map(|cascade| {
                let mut layer = Vec::with_capacity((n * n) as usize);
                for y in 0..n {
                    for x in 0..n {
                        let (mx, my) = ((n - x) % n, (n - y) % n);
                        let xi = gaussian_pair(noise[(y * n + x) as usize]);
                        let xi_mirror = gaussian_pair(noise[(my * n + mx) as usize]);

                        let k = wave_vector(x, y, n, cascade.size);
                        let amplitude =
                            (phillips(k, params.wind, params.alignment, cascade) * 0.5).sqrt() * n2;
                        let amplitude_mirror =
                            (phillips(-k, params.wind, params.alignment, cascade) * 0.5).sqrt() * n2;

                        layer.push(Vec4::new(
                            xi[0] * amplitude,
                            xi[1] * amplitude,
                            xi_mirror[0] * amplitude_mirror,
                            -xi_mirror[1] * amplitude_mirror,
                        ));
                    }
                }
                layer
            })
            .collect();

        Self { resolution: n, layers }
    }

    /// A single travelling wave `amplitude * sin(omega*t - k.x)` in cascade
    /// `cascade` (all other cascades flat)
    ///
    /// `wave` is the integer wave index: `k = 2*pi*wave / size`.
    pub fn monochromatic(
        resolution: u32,
        cascade_count: usize,
        cascade: usize,
        wave: IVec2,
        amplitude: f32,
    ) -> OceanResult<Self> {
        let half = (resolution / 2) as i32;
        if cascade >= cascade_count || cascade_count > MAX_CASCADES {
            return Err(OceanError::invalid_config(
                "cascade",
                cascade,
                format!("out of range for {cascade_count} cascades"),
            ));
        }
        if wave == IVec2::ZERO || wave.abs().max_element() >= half {
            return Err(OceanError::invalid_config(
                "wave",
                wave,
                format!("must be non-zero and strictly inside +-{half}"),
            ));
        }

        let n = resolution as usize;
        let n2 = (resolution * resolution) as f32;
        let mut layers = vec![vec![Vec4::ZERO; n * n]; cascade_count];

        let texel = |w: IVec2| ((w.y + half) as usize) * n + (w.x + half) as usize;
        // h0(k) = i*a/2 and h0(-k) = 0, so the mirror texel carries conj(h0(k))
        let h0 = amplitude * 0.5 * n2;
        layers[cascade][texel(wave)].y = h0;
        layers[cascade][texel(-wave)].w = -h0;

        Ok(Self { resolution, layers })
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn cascade_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, cascade: usize) -> &[Vec4] {
        &self.layers[cascade]
    }

    pub fn texel(&self, cascade: usize, x: u32, y: u32) -> Vec4 {
        self.layers[cascade][(y * self.resolution + x) as usize]
    }

    /// Upload payload for a `MAX_CASCADES`-layer texture array; missing
    /// cascades are zero
    pub fn texture_data(&self) -> Vec<[f32; 4]> {
        let texels = (self.resolution * self.resolution) as usize;
        let mut data = vec![[0.0; 4]; texels * MAX_CASCADES];
        for (layer, values) in self.layers.iter().enumerate().take(MAX_CASCADES) {
            for (dst, src) in data[layer * texels..].iter_mut().zip(values) {
                *dst = src.to_array();
            }
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> OceanFieldParams {
        OceanFieldParams {
            resolution: 16,
            random_seed: 3,
            ..OceanFieldParams::default()
        }
    }

    #[test]
    fn test_wave_vector_is_centred() {
        assert_eq!(wave_vector(8, 8, 16, 10.0), Vec2::ZERO);
        let k = wave_vector(9, 8, 16, 10.0);
        assert!((k.x - std::f32::consts::TAU / 10.0).abs() < 1e-6);
        assert_eq!(k.y, 0.0);
    }

    #[test]
    fn test_phillips_band_limits() {
        let cascade = Cascade::default();
        let wind = Vec2::new(4.5, 2.5);
        assert_eq!(phillips(Vec2::ZERO, wind, 1.0, &cascade), 0.0);
        assert!(phillips(Vec2::new(0.5, 0.0), wind, 1.0, &cascade) > 0.0);

        let narrow = Cascade {
            min_wave: 20.0,
            max_wave: 40.0,
            ..cascade
        };
        // Wavelength 10 m is outside [20, 40]
        let k = Vec2::new(std::f32::consts::TAU / 10.0, 0.0);
        assert_eq!(phillips(k, wind, 1.0, &narrow), 0.0);
    }

    #[test]
    fn test_phillips_prefers_wind_direction() {
        let cascade = Cascade::default();
        let wind = Vec2::new(10.0, 0.0);
        let along = phillips(Vec2::new(0.3, 0.0), wind, 2.0, &cascade);
        let across = phillips(Vec2::new(0.0, 0.3), wind, 2.0, &cascade);
        assert!(along > 0.0);
        assert_eq!(across, 0.0);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let params = small_params();
        let a = InitialSpectrum::generate(&params);
        let b = InitialSpectrum::generate(&params);
        assert_eq!(a, b);

        let other = InitialSpectrum::generate(&OceanFieldParams {
            random_seed: 4,
            ..params
        });
        assert_ne!(a, other);
    }

    #[test]
    fn test_mirror_channel_is_conjugate_of_opposite_texel() {
        let params = small_params();
        let spectrum = InitialSpectrum::generate(&params);
        let (x, y) = (5, 11);
        let here = spectrum.texel(0, x, y);
        let there = spectrum.texel(0, 16 - x, 16 - y);
        assert!((here.z - there.x).abs() < 1e-3 * there.x.abs().max(1.0));
        assert!((here.w + there.y).abs() < 1e-3 * there.y.abs().max(1.0));
    }

    #[test]
    fn test_monochromatic_layout() {
        let spectrum = InitialSpectrum::monochromatic(32, 2, 1, IVec2::new(6, 0), 0.5).unwrap();
        let n2 = 32.0 * 32.0;
        assert_eq!(spectrum.texel(1, 16 + 6, 16).y, 0.25 * n2);
        assert_eq!(spectrum.texel(1, 16 - 6, 16).w, -0.25 * n2);
        assert!(spectrum.layer(0).iter().all(|t| *t == Vec4::ZERO));

        assert!(InitialSpectrum::monochromatic(32, 2, 2, IVec2::new(6, 0), 0.5).is_err());
        assert!(InitialSpectrum::monochromatic(32, 1, 0, IVec2::ZERO, 0.5).is_err());
        assert!(InitialSpectrum::monochromatic(32, 1, 0, IVec2::new(16, 0), 0.5).is_err());
    }

    #[test]
    fn test_evolve_texel_at_rest_is_height_only_for_zero_k() {
        let packed = evolve_texel(Vec4::new(1.0, 0.0, 0.0, 0.0), Vec2::ZERO, 0.0);
        // Dx + i*H with H = 1, Dx = 0
        assert_eq!(packed[0], Vec4::new(0.0, 1.0, 0.0, 0.0));
        assert_eq!(packed[1], Vec4::ZERO);
    }
}
