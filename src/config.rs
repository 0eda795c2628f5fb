//! Simulation configuration
//!
//! One TOML document configures the ocean, the physics world and the
//! default floating-body coefficients. Every table is optional; missing
//! keys keep their defaults.
//!
//! ```toml
//! sampleLifetimeMs = 500
//!
//! [ocean]
//! resolution = 128
//! wind = [6.0, 1.0]
//!
//! [world]
//! damping = 0.1
//!
//! [floatingBody]
//! buoyancyStrength = 0.9
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OceanError, OceanResult};
use crate::ocean::{FloatingBodyOptions, OceanFieldOverrides, OceanFieldParams};
use crate::physics::WorldConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Merged over [`OceanFieldParams::default`]
    pub ocean: OceanFieldOverrides,
    pub world: WorldConfig,
    pub floating_body: FloatingBodyOptions,
    pub sample_lifetime_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ocean: OceanFieldOverrides::default(),
            world: WorldConfig::default(),
            floating_body: FloatingBodyOptions::default(),
            sample_lifetime_ms: 1000,
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(source: &str) -> OceanResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| OceanError::ConfigLoad {
            path: "<string>".to_string(),
            error: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> OceanResult<Self> {
        let path = path.as_ref();
        let load_error = |error: String| OceanError::ConfigLoad {
            path: path.display().to_string(),
            error,
        };

        let source = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let config: Self = toml::from_str(&source).map_err(|e| load_error(e.to_string()))?;
        config.validate()?;
        log::info!("[SimulationConfig::load] loaded {}", path.display());
        Ok(config)
    }

    /// Ocean parameters with the overrides applied
    pub fn ocean_params(&self) -> OceanFieldParams {
        self.ocean.apply_to(&OceanFieldParams::default())
    }

    pub fn sample_lifetime(&self) -> Duration {
        Duration::from_millis(self.sample_lifetime_ms)
    }

    pub fn validate(&self) -> OceanResult<()> {
        self.ocean_params().validate()?;

        let world = &self.world;
        if !world.gravity.is_finite() {
            return Err(OceanError::invalid_config(
                "world.gravity",
                world.gravity,
                "must be finite",
            ));
        }
        if !(world.damping >= 0.0) || !(world.angular_damping >= 0.0) {
            return Err(OceanError::invalid_config(
                "world.damping",
                format!("{} / {}", world.damping, world.angular_damping),
                "damping coefficients must be non-negative",
            ));
        }

        let body = &self.floating_body;
        if !(body.submerge_depth > 0.0) || !body.submerge_depth.is_finite() {
            return Err(OceanError::invalid_config(
                "floatingBody.submergeDepth",
                body.submerge_depth,
                "must be positive",
            ));
        }
        if !body.gravity.is_finite() {
            return Err(OceanError::invalid_config(
                "floatingBody.gravity",
                body.gravity,
                "must be finite",
            ));
        }

        if self.sample_lifetime_ms == 0 {
            return Err(OceanError::invalid_config(
                "sampleLifetimeMs",
                self.sample_lifetime_ms,
                "must be at least 1",
            ));
        }

        log::debug!(
            "[SimulationConfig::validate] ok: resolution={} lifetime={}ms",
            self.ocean_params().resolution,
            self.sample_lifetime_ms
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let config = SimulationConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.ocean_params(), OceanFieldParams::default());
    }

    #[test]
    fn test_partial_document() {
        let config = SimulationConfig::from_toml_str(
            r#"
            sampleLifetimeMs = 250

            [ocean]
            resolution = 64
            wind = [6.0, 1.0]

            [world]
            damping = 0.5

            [floatingBody]
            buoyancyStrength = 0.9
            "#,
        )
        .unwrap();

        let params = config.ocean_params();
        assert_eq!(params.resolution, 64);
        assert_eq!(params.wind, Vec2::new(6.0, 1.0));
        assert_eq!(params.cascades.len(), 3);
        assert_eq!(config.world.damping, 0.5);
        assert_eq!(config.world.gravity, Vec3::new(0.0, -9.8, 0.0));
        assert_eq!(config.floating_body.buoyancy_strength, 0.9);
        assert_eq!(config.floating_body.submerge_depth, 1.0);
        assert_eq!(config.sample_lifetime(), Duration::from_millis(250));

        let buoyancy = crate::ocean::OceanFieldBuoyancy::with_sample_lifetime(config.sample_lifetime());
        assert_eq!(buoyancy.sample_lifetime(), Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_resolution = SimulationConfig::from_toml_str("[ocean]\nresolution = 100\n");
        assert!(matches!(bad_resolution, Err(OceanError::InvalidConfig { .. })));

        let bad_depth = SimulationConfig::from_toml_str("[floatingBody]\nsubmergeDepth = 0.0\n");
        assert!(matches!(bad_depth, Err(OceanError::InvalidConfig { .. })));

        let bad_damping = SimulationConfig::from_toml_str("[world]\ndamping = -1.0\n");
        assert!(matches!(bad_damping, Err(OceanError::InvalidConfig { .. })));

        let malformed = SimulationConfig::from_toml_str("[ocean\n");
        assert!(matches!(malformed, Err(OceanError::ConfigLoad { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ocean]\nrandomSeed = 42").unwrap();
        let config = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(config.ocean_params().random_seed, 42);

        let missing = SimulationConfig::load("/nonexistent/ocean.toml");
        assert!(matches!(missing, Err(OceanError::ConfigLoad { .. })));
    }
}
