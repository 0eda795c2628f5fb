//! Ocean field parameters
//!
//! Parameters are immutable per build. Overrides are partial: anything left
//! `None` keeps the base value (defaults on build, the field's current
//! parameters on update).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{OceanError, OceanResult};

/// Upper bound on cascades; GPU texture arrays are sized for this many
pub const MAX_CASCADES: usize = 3;
pub const MIN_RESOLUTION: u32 = 4;
pub const MAX_RESOLUTION: u32 = 1024;

/// One spectral band of the ocean at a given tile size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cascade {
    /// World-space tile size in metres
    pub size: f32,
    /// Spectrum amplitude scale
    pub strength: f32,
    /// Horizontal displacement scale
    pub croppiness: f32,
    /// Shortest wavelength kept (metres)
    pub min_wave: f32,
    /// Longest wavelength kept (metres)
    pub max_wave: f32,
}

impl Default for Cascade {
    fn default() -> Self {
        Self {
            size: 100.0,
            strength: 2.0,
            croppiness: -1.5,
            min_wave: 1.0e-6,
            max_wave: 1.0e6,
        }
    }
}

impl Cascade {
    pub fn with_size(size: f32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Phillips amplitude `A` for this cascade
    pub fn spectrum_strength(&self) -> f32 {
        self.strength * 0.081 / (self.size * self.size)
    }

    /// Smallest retained wavenumber, `2*pi / max_wave`
    pub fn min_k(&self) -> f32 {
        std::f32::consts::TAU / self.max_wave
    }

    /// Largest retained wavenumber, `2*pi / min_wave`
    pub fn max_k(&self) -> f32 {
        std::f32::consts::TAU / self.min_wave
    }
}

/// Full parameter set of an ocean field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OceanFieldParams {
    pub cascades: Vec<Cascade>,
    /// Texture resolution `N`, power of two
    pub resolution: u32,
    /// Wind velocity on the xz plane (m/s)
    pub wind: Vec2,
    /// Exponent of the wind-direction factor; larger values align waves
    /// with the wind more tightly
    pub alignment: f32,
    /// Carried for renderers, unused by the simulation
    pub foam_spreading: f32,
    /// Carried for renderers, unused by the simulation
    pub foam_contrast: f32,
    pub random_seed: u64,
}

impl Default for OceanFieldParams {
    fn default() -> Self {
        Self {
            cascades: vec![
                Cascade::with_size(100.0),
                Cascade::with_size(60.0),
                Cascade::with_size(6.0),
            ],
            resolution: 256,
            wind: Vec2::new(4.5, 2.5),
            alignment: 1.0,
            foam_spreading: 1.0,
            foam_contrast: 2.0,
            random_seed: 0,
        }
    }
}

impl OceanFieldParams {
    /// Check every invariant the builders rely on
    pub fn validate(&self) -> OceanResult<()> {
        let n = self.resolution;
        if !n.is_power_of_two() || !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&n) {
            return Err(OceanError::invalid_config(
                "resolution",
                n,
                format!("must be a power of two in [{MIN_RESOLUTION}, {MAX_RESOLUTION}]"),
            ));
        }

        if self.cascades.is_empty() || self.cascades.len() > MAX_CASCADES {
            return Err(OceanError::invalid_config(
                "cascades",
                self.cascades.len(),
                format!("expected between 1 and {MAX_CASCADES} cascades"),
            ));
        }

        for (i, cascade) in self.cascades.iter().enumerate() {
            if !(cascade.size.is_finite() && cascade.size > 0.0) {
                return Err(OceanError::invalid_config(
                    format!("cascades[{i}].size"),
                    cascade.size,
                    "must be positive",
                ));
            }
            if !(cascade.min_wave > 0.0 && cascade.min_wave < cascade.max_wave) {
                return Err(OceanError::invalid_config(
                    format!("cascades[{i}].minWave"),
                    cascade.min_wave,
                    format!("must be positive and below maxWave ({})", cascade.max_wave),
                ));
            }
            if !cascade.strength.is_finite() || !cascade.croppiness.is_finite() {
                return Err(OceanError::invalid_config(
                    format!("cascades[{i}]"),
                    format!("{:?}", cascade),
                    "strength and croppiness must be finite",
                ));
            }
        }

        if !self.wind.is_finite() {
            return Err(OceanError::invalid_config("wind", self.wind, "must be finite"));
        }
        if !(self.alignment >= 0.0) {
            return Err(OceanError::invalid_config(
                "alignment",
                self.alignment,
                "must be non-negative",
            ));
        }

        Ok(())
    }
}

/// Partial parameter set merged over a base
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OceanFieldOverrides {
    /// Replaces the whole cascade list when present
    pub cascades: Option<Vec<Cascade>>,
    pub resolution: Option<u32>,
    pub wind: Option<Vec2>,
    pub alignment: Option<f32>,
    pub foam_spreading: Option<f32>,
    pub foam_contrast: Option<f32>,
    pub random_seed: Option<u64>,
}

impl OceanFieldOverrides {
    pub fn apply_to(&self, base: &OceanFieldParams) -> OceanFieldParams {
        OceanFieldParams {
            cascades: self.cascades.clone().unwrap_or_else(|| base.cascades.clone()),
            resolution: self.resolution.unwrap_or(base.resolution),
            wind: self.wind.unwrap_or(base.wind),
            alignment: self.alignment.unwrap_or(base.alignment),
            foam_spreading: self.foam_spreading.unwrap_or(base.foam_spreading),
            foam_contrast: self.foam_contrast.unwrap_or(base.foam_contrast),
            random_seed: self.random_seed.unwrap_or(base.random_seed),
        }
    }
}

impl From<OceanFieldParams> for OceanFieldOverrides {
    fn from(params: OceanFieldParams) -> Self {
        Self {
            cascades: Some(params.cascades),
            resolution: Some(params.resolution),
            wind: Some(params.wind),
            alignment: Some(params.alignment),
            foam_spreading: Some(params.foam_spreading),
            foam_contrast: Some(params.foam_contrast),
            random_seed: Some(params.random_seed),
        }
    }
}
