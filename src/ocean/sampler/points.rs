//! GPU sampler of arbitrary xz positions

use std::future::Future;
use std::time::Duration;

use glam::{Vec2, Vec3};

use super::base::SamplerCore;
use super::sample::{Sample, SampleError, DEFAULT_POLL_INTERVAL};
use super::{check_points, WaveSampler};
use crate::error::OceanResult;
use crate::ocean::field::OceanField;

pub struct PointsSampler {
    core: SamplerCore,
}

impl PointsSampler {
    pub fn new(field: &OceanField, points_number: usize) -> OceanResult<Self> {
        Ok(Self {
            core: SamplerCore::new(field, points_number, "Ocean Points Sampler")?,
        })
    }

    pub fn points_number(&self) -> usize {
        self.core.capacity()
    }

    /// Resize for `points_number` queries, replacing the buffers
    pub fn set_points_number(&mut self, points_number: usize) {
        if points_number != self.core.capacity() {
            self.core.resize(points_number);
        }
    }

    pub fn sample_lifetime(&self) -> Duration {
        self.core.lifetime()
    }

    pub fn set_sample_lifetime(&mut self, lifetime: Duration) {
        self.core.set_lifetime(lifetime);
    }

    pub fn sample(&mut self, points: &[Vec2]) -> OceanResult<Sample<Vec<Vec3>>> {
        check_points(self.core.capacity(), points)?;
        self.core.write_queries(points);
        self.core.dispatch(Vec2::ZERO, 1.0, points.len())
    }

    /// Issue a sample and resolve once it completes or times out
    pub fn sample_async(
        &mut self,
        points: &[Vec2],
    ) -> OceanResult<impl Future<Output = Result<Vec<Vec3>, SampleError>> + Send + 'static> {
        let sample = self.sample(points)?;
        Ok(sample.wait(DEFAULT_POLL_INTERVAL))
    }

    /// Release the buffers; pending samples keep their own staging buffers
    pub fn dispose(self) {
        log::debug!("[PointsSampler::dispose] {} points", self.core.capacity());
    }
}

impl WaveSampler for PointsSampler {
    fn points_number(&self) -> usize {
        PointsSampler::points_number(self)
    }

    fn sample_lifetime(&self) -> Duration {
        PointsSampler::sample_lifetime(self)
    }

    fn set_sample_lifetime(&mut self, lifetime: Duration) {
        PointsSampler::set_sample_lifetime(self, lifetime)
    }

    fn sample(&mut self, points: &[Vec2]) -> OceanResult<Sample<Vec<Vec3>>> {
        PointsSampler::sample(self, points)
    }
}
