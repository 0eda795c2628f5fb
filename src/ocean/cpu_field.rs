//! CPU reference ocean field
//!
//! Runs the same stage sequence as [`OceanField`](super::OceanField) on the
//! CPU: time spectrum, horizontal then vertical butterfly passes over the
//! shared [`ButterflyTable`], post-process. Rows are processed in parallel
//! with rayon. Used headless (tests, tools, machines without an adapter)
//! and as the oracle for the GPU programs.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use rayon::prelude::*;

use super::cache::ResolutionCache;
use super::cpu_field_data::CpuDataMaps;
use super::cpu_field_operations::{evolve_cascades, flat_maps, inverse_transform};
use super::params::{OceanFieldOverrides, OceanFieldParams};
use super::sampler::{CpuPatchSampler, CpuPointsSampler};
use super::spectrum::InitialSpectrum;
use crate::error::{OceanError, OceanResult};
use crate::fft::ButterflyTable;

/// FFT ocean surface evaluated on the CPU
pub struct CpuOceanField {
    params: OceanFieldParams,
    time: f32,
    table: Arc<ButterflyTable>,
    spectrum: InitialSpectrum,
    maps: Arc<RwLock<CpuDataMaps>>,
}

impl CpuOceanField {
    /// Field with the seeded initial spectrum of `params`
    pub fn new(params: OceanFieldParams) -> OceanResult<Self> {
        params.validate()?;
        let table = Arc::new(ButterflyTable::new(params.resolution)?);
        let spectrum = InitialSpectrum::generate(&params);
        Ok(Self::from_parts(params, table, spectrum))
    }

    /// Field driven by an explicit initial spectrum
    pub fn with_spectrum(params: OceanFieldParams, spectrum: InitialSpectrum) -> OceanResult<Self> {
        params.validate()?;
        check_spectrum(&params, &spectrum)?;
        let table = Arc::new(ButterflyTable::new(params.resolution)?);
        Ok(Self::from_parts(params, table, spectrum))
    }

    fn from_parts(
        params: OceanFieldParams,
        table: Arc<ButterflyTable>,
        spectrum: InitialSpectrum,
    ) -> Self {
        log::info!(
            "[CpuOceanField::new] resolution={} cascades={}",
            params.resolution,
            params.cascades.len()
        );
        let maps = Arc::new(RwLock::new(flat_maps(&params)));
        Self {
            params,
            time: 0.0,
            table,
            spectrum,
            maps,
        }
    }

    pub fn params(&self) -> &OceanFieldParams {
        &self.params
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn initial_spectrum(&self) -> &InitialSpectrum {
        &self.spectrum
    }

    /// Replace the initial spectrum; takes effect on the next update
    pub fn set_initial_spectrum(&mut self, spectrum: InitialSpectrum) -> OceanResult<()> {
        check_spectrum(&self.params, &spectrum)?;
        self.spectrum = spectrum;
        Ok(())
    }

    /// Data maps of the last update
    pub fn data_maps(&self) -> RwLockReadGuard<'_, CpuDataMaps> {
        self.maps.read()
    }

    pub(crate) fn shared_maps(&self) -> &Arc<RwLock<CpuDataMaps>> {
        &self.maps
    }

    /// Recompute the data maps for `time` seconds
    pub fn update(&mut self, time: f32) -> OceanResult<()> {
        self.time = time;
        let mut layers = evolve_cascades(&self.params, &self.spectrum, time);

        let table = self.table.as_ref();
        layers
            .par_iter_mut()
            .for_each(|layer| inverse_transform(table, layer));

        self.maps.write().layers = layers;
        log::debug!(
            "[CpuOceanField::update] t={:.3} passes={}",
            time,
            2 * table.stages() + 2
        );
        Ok(())
    }

    pub fn create_points_sampler(&self, points_number: usize) -> CpuPointsSampler {
        CpuPointsSampler::new(self, points_number)
    }

    pub fn create_patch_sampler(&self, patch_resolution: u32) -> OceanResult<CpuPatchSampler> {
        CpuPatchSampler::new(self, patch_resolution)
    }

    fn apply(&mut self, params: OceanFieldParams, table: Arc<ButterflyTable>) {
        self.spectrum = InitialSpectrum::generate(&params);
        let mut maps = self.maps.write();
        maps.sizes = params.cascades.iter().map(|c| c.size).collect();
        maps.croppinesses = params.cascades.iter().map(|c| c.croppiness).collect();
        drop(maps);
        self.params = params;
        self.table = table;
    }
}

fn check_spectrum(params: &OceanFieldParams, spectrum: &InitialSpectrum) -> OceanResult<()> {
    if spectrum.resolution() != params.resolution
        || spectrum.cascade_count() != params.cascades.len()
    {
        return Err(OceanError::invalid_config(
            "spectrum",
            format!("{}x{} cascades", spectrum.resolution(), spectrum.cascade_count()),
            format!(
                "field expects resolution {} with {} cascades",
                params.resolution,
                params.cascades.len()
            ),
        ));
    }
    Ok(())
}

/// Builds [`CpuOceanField`]s, caching butterfly tables per resolution
pub struct CpuOceanFieldBuilder {
    tables: ResolutionCache<Arc<ButterflyTable>>,
}

impl Default for CpuOceanFieldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuOceanFieldBuilder {
    pub fn new() -> Self {
        Self {
            tables: ResolutionCache::new("cpu butterfly"),
        }
    }

    pub fn build(&mut self, overrides: impl Into<OceanFieldOverrides>) -> OceanResult<CpuOceanField> {
        let params = overrides.into().apply_to(&OceanFieldParams::default());
        params.validate()?;
        let table = self.table(params.resolution)?;
        let spectrum = InitialSpectrum::generate(&params);
        Ok(CpuOceanField::from_parts(params, table, spectrum))
    }

    /// Merge `overrides` over the field's parameters and regenerate its
    /// initial spectrum
    ///
    /// A resolution change is rejected, as for the GPU builder.
    pub fn update(
        &mut self,
        field: &mut CpuOceanField,
        overrides: impl Into<OceanFieldOverrides>,
    ) -> OceanResult<()> {
        let params = overrides.into().apply_to(field.params());
        params.validate()?;
        if params.resolution != field.params().resolution {
            return Err(OceanError::invalid_config(
                "resolution",
                params.resolution,
                format!(
                    "field was built at {}; build a new one",
                    field.params().resolution
                ),
            ));
        }
        if params.cascades.len() != field.params().cascades.len() {
            // Map layer count follows the cascade count
            *field.maps.write() = flat_maps(&params);
        }
        let table = self.table(params.resolution)?;
        field.apply(params, table);
        Ok(())
    }

    pub fn evict(&mut self, resolution: u32) {
        self.tables.evict(resolution);
    }

    pub fn clear_cache(&mut self) {
        self.tables.clear();
    }

    fn table(&mut self, resolution: u32) -> OceanResult<Arc<ButterflyTable>> {
        let table = self
            .tables
            .get_or_try_insert_with(resolution, || ButterflyTable::new(resolution).map(Arc::new))?;
        Ok(table.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::cpu_field_operations::{displacement, surface_point, texel};
    use crate::ocean::params::Cascade;
    use crate::ocean::spectrum::{dispersion, GRAVITY};
    use approx::assert_relative_eq;
    use glam::{IVec2, Vec2, Vec3, Vec4};
    use std::f32::consts::{PI, TAU};

    const SIZE: f32 = 60.0;
    const AMPLITUDE: f32 = 0.5;
    // Wave index 6 over 60 m: wavelength 10 m
    const WAVE: IVec2 = IVec2::new(6, 0);

    fn single_wave_field(croppiness: f32) -> CpuOceanField {
        let params = OceanFieldParams {
            cascades: vec![Cascade {
                size: SIZE,
                croppiness,
                ..Cascade::default()
            }],
            resolution: 32,
            wind: Vec2::new(10.0, 0.0),
            ..OceanFieldParams::default()
        };
        let spectrum = InitialSpectrum::monochromatic(32, 1, 0, WAVE, AMPLITUDE).unwrap();
        CpuOceanField::with_spectrum(params, spectrum).unwrap()
    }

    fn k() -> f32 {
        TAU * WAVE.x as f32 / SIZE
    }

    fn origin(field: &CpuOceanField, layer: usize) -> Vec4 {
        texel(&field.data_maps(), layer, 0, 0)
    }

    #[test]
    fn test_single_wave_crest_timing() {
        let mut field = single_wave_field(0.0);
        let omega = (GRAVITY * TAU / 10.0).sqrt();

        field.update(0.0).unwrap();
        assert!(origin(&field, 0).y.abs() < 1e-4);

        field.update(PI / (2.0 * omega)).unwrap();
        assert_relative_eq!(origin(&field, 0).y, AMPLITUDE, epsilon = 1e-3);
    }

    #[test]
    fn test_single_wave_profile() {
        let mut field = single_wave_field(0.0);
        let time = 0.7;
        field.update(time).unwrap();
        let omega = dispersion(k());

        let maps = field.data_maps();
        for x in [0, 3, 11, 20] {
            let world_x = x as f32 * SIZE / 32.0;
            let phase = k() * world_x - omega * time;
            let value = texel(&maps, 0, x, 5);
            // Height, horizontal displacement, slope
            assert_relative_eq!(value.y, -AMPLITUDE * phase.sin(), epsilon = 1e-3);
            assert_relative_eq!(value.x, AMPLITUDE * phase.cos(), epsilon = 1e-3);
            assert!(value.z.abs() < 1e-3);
            let slope = texel(&maps, 1, x, 5);
            assert_relative_eq!(slope.x, -AMPLITUDE * k() * phase.cos(), epsilon = 1e-3);
        }
    }

    #[test]
    fn test_dispersion_matches_phase_speed() {
        let mut field = single_wave_field(0.0);
        let dt = 0.01;

        field.update(-dt).unwrap();
        let before = origin(&field, 0).y;
        field.update(dt).unwrap();
        let after = origin(&field, 0).y;
        field.update(0.0).unwrap();
        let slope = origin(&field, 1).x;

        let dhdt = (after - before) / (2.0 * dt);
        let speed = -dhdt / slope;
        let expected = (GRAVITY / k()).sqrt();
        assert_relative_eq!(speed, expected, max_relative = 0.01);
    }

    #[test]
    fn test_update_is_deterministic() {
        let params = OceanFieldParams {
            resolution: 16,
            random_seed: 11,
            ..OceanFieldParams::default()
        };
        let mut a = CpuOceanField::new(params.clone()).unwrap();
        let mut b = CpuOceanField::new(params).unwrap();
        a.update(1.25).unwrap();
        b.update(1.25).unwrap();
        assert_eq!(*a.data_maps(), *b.data_maps());
        assert!(a.data_maps().layers()[0].iter().any(|t| t.y != 0.0));
    }

    #[test]
    fn test_calm_sea_is_flat() {
        let params = OceanFieldParams {
            resolution: 16,
            wind: Vec2::ZERO,
            ..OceanFieldParams::default()
        };
        let mut field = CpuOceanField::new(params).unwrap();
        field.update(3.0).unwrap();
        let maps = field.data_maps();
        assert!(maps.layers().iter().flatten().all(|t| *t == Vec4::ZERO));
        assert_eq!(surface_point(&maps, Vec2::new(4.0, -7.0)), Vec3::new(4.0, 0.0, -7.0));
    }

    #[test]
    fn test_surface_point_without_croppiness_reads_height() {
        let mut field = single_wave_field(0.0);
        field.update(0.4).unwrap();
        let maps = field.data_maps();
        // On-grid query needs no interpolation
        let x = 7.0 * SIZE / 32.0;
        let point = surface_point(&maps, Vec2::new(x, 0.0));
        assert_relative_eq!(point.y, texel(&maps, 0, 7, 0).y, epsilon = 1e-5);
        assert_eq!(point.x, x);
    }

    #[test]
    fn test_surface_point_inverts_choppy_displacement() {
        let mut field = single_wave_field(-1.0);
        field.update(0.2).unwrap();
        let maps = field.data_maps();

        let target = Vec2::new(13.0, 2.0);
        let point = surface_point(&maps, target);

        // Re-derive the source point and check it lands on the target
        let mut p = target;
        for _ in 0..32 {
            let d = displacement(&maps, p);
            p = target - Vec2::new(d.x, d.z);
        }
        let d = displacement(&maps, p);
        assert!((p + Vec2::new(d.x, d.z) - target).length() < 1e-2);
        assert_relative_eq!(point.y, d.y, epsilon = 2e-2);
    }

    #[test]
    fn test_builder_rejects_resolution_change() {
        let mut builder = CpuOceanFieldBuilder::new();
        let mut field = builder
            .build(OceanFieldOverrides {
                resolution: Some(16),
                ..Default::default()
            })
            .unwrap();

        let err = builder.update(
            &mut field,
            OceanFieldOverrides {
                resolution: Some(32),
                ..Default::default()
            },
        );
        assert!(matches!(err, Err(OceanError::InvalidConfig { .. })));

        builder
            .update(
                &mut field,
                OceanFieldOverrides {
                    random_seed: Some(99),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(field.params().random_seed, 99);
        assert_eq!(field.params().resolution, 16);
    }

    #[test]
    fn test_builder_shares_tables_per_resolution() {
        let mut builder = CpuOceanFieldBuilder::new();
        let overrides = OceanFieldOverrides {
            resolution: Some(16),
            ..Default::default()
        };
        let a = builder.build(overrides.clone()).unwrap();
        let b = builder.build(overrides).unwrap();
        assert!(Arc::ptr_eq(&a.table, &b.table));

        builder.evict(16);
        let c = builder
            .build(OceanFieldOverrides {
                resolution: Some(16),
                ..Default::default()
            })
            .unwrap();
        assert!(!Arc::ptr_eq(&a.table, &c.table));
    }
}
