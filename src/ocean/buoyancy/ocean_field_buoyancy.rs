//! Batched water sampling for every floating body
//!
//! All floaters of all registered bodies go through one points sampler per
//! frame. A frame either issues a new sample (when none is in flight) or
//! polls the pending one; forces are applied from the latest completed
//! result. Forces therefore lag body motion by at least one frame, which
//! keeps the physics step from ever waiting on the GPU.

use std::time::Duration;

use glam::{Mat4, Vec2, Vec3};

use super::floating_body::{FloatingBody, FloatingBodyOptions};
use crate::error::OceanResult;
use crate::ocean::sampler::{Sample, SampleStatus, WaveSampler, DEFAULT_SAMPLE_LIFETIME};
use crate::ocean::OceanSurface;
use crate::physics::{BodyHandle, World};

pub struct OceanFieldBuoyancy {
    bodies: Vec<FloatingBody>,
    // Floater world positions and their xz at the last issue
    world: Vec<Vec3>,
    points: Vec<Vec2>,
    sampled: Option<Vec<Vec3>>,
    sample: Option<Sample<Vec<Vec3>>>,
    sampler: Option<Box<dyn WaveSampler>>,
    sample_lifetime: Duration,
    dirty: bool,
}

impl Default for OceanFieldBuoyancy {
    fn default() -> Self {
        Self::new()
    }
}

impl OceanFieldBuoyancy {
    pub fn new() -> Self {
        Self::with_sample_lifetime(DEFAULT_SAMPLE_LIFETIME)
    }

    /// Coupling whose water samples time out after `lifetime`
    pub fn with_sample_lifetime(lifetime: Duration) -> Self {
        Self {
            bodies: Vec::new(),
            world: Vec::new(),
            points: Vec::new(),
            sampled: None,
            sample: None,
            sampler: None,
            sample_lifetime: lifetime,
            dirty: true,
        }
    }

    pub fn sample_lifetime(&self) -> Duration {
        self.sample_lifetime
    }

    /// Applies to the next sample issued
    pub fn set_sample_lifetime(&mut self, lifetime: Duration) {
        self.sample_lifetime = lifetime;
        if let Some(sampler) = self.sampler.as_mut() {
            sampler.set_sample_lifetime(lifetime);
        }
    }

    /// Register `body` with body-local `floaters`
    ///
    /// Invalidates the batched sampler and any result gathered for the
    /// previous body set.
    pub fn create_floating_body(
        &mut self,
        body: BodyHandle,
        floaters: Vec<Vec3>,
        options: FloatingBodyOptions,
    ) -> &FloatingBody {
        log::debug!(
            "[OceanFieldBuoyancy::create_floating_body] body {} with {} floaters",
            body.id(),
            floaters.len()
        );
        self.bodies.push(FloatingBody::new(body, floaters, options));
        self.invalidate();
        &self.bodies[self.bodies.len() - 1]
    }

    /// Unregister the floating body driving `body`
    pub fn destroy_floating_body(&mut self, body: BodyHandle) -> Option<FloatingBody> {
        let index = self.bodies.iter().position(|b| b.body() == body)?;
        let removed = self.bodies.remove(index);
        self.invalidate();
        Some(removed)
    }

    pub fn bodies(&self) -> &[FloatingBody] {
        &self.bodies
    }

    pub fn floating_body_mut(&mut self, body: BodyHandle) -> Option<&mut FloatingBody> {
        self.bodies.iter_mut().find(|b| b.body() == body)
    }

    pub fn floater_count(&self) -> usize {
        self.bodies.iter().map(|b| b.floaters().len()).sum()
    }

    /// True while a sample is in flight
    pub fn is_sampling(&self) -> bool {
        self.sample.is_some()
    }

    fn invalidate(&mut self) {
        self.dirty = true;
        self.sample = None;
        // Indices of an old result no longer line up with the floaters
        self.sampled = None;
    }

    /// One frame: issue or poll the water sample, then accumulate forces
    /// from the latest result on every dynamic body
    pub fn update(&mut self, surface: &dyn OceanSurface, world: &mut World) -> OceanResult<()> {
        self.sample_surface(surface, world)?;

        let Some(sampled) = &self.sampled else {
            return Ok(());
        };

        let mut offset = 0;
        for floating in &self.bodies {
            let range = offset..offset + floating.floaters().len();
            offset = range.end;

            match world.body_mut(floating.body()) {
                Some(body) if body.is_dynamic() => {
                    floating.apply_forces(body, &sampled[range.clone()], &self.world[range]);
                }
                Some(_) => {}
                None => log::warn!(
                    "[OceanFieldBuoyancy::update] body {} is no longer in the world",
                    floating.body().id()
                ),
            }
        }
        Ok(())
    }

    fn sample_surface(&mut self, surface: &dyn OceanSurface, world: &World) -> OceanResult<()> {
        match self.sample.take() {
            None => self.issue(surface, world),
            Some(mut sample) => {
                match sample.status() {
                    SampleStatus::Pending => self.sample = Some(sample),
                    SampleStatus::Complete => match sample.outcome() {
                        Ok(result) => self.sampled = Some(result),
                        Err(e) => log::warn!("[OceanFieldBuoyancy::update] sample failed: {}", e),
                    },
                    SampleStatus::Timeout => {
                        log::warn!(
                            "[OceanFieldBuoyancy::update] sample timed out after {:?}; keeping last result",
                            sample.lifetime()
                        );
                        sample.release();
                    }
                }
                Ok(())
            }
        }
    }

    fn issue(&mut self, surface: &dyn OceanSurface, world: &World) -> OceanResult<()> {
        self.world.clear();
        self.points.clear();
        for floating in &self.bodies {
            let transform = world
                .body(floating.body())
                .map_or(Mat4::IDENTITY, |body| body.transform());
            for floater in floating.floaters() {
                let position = transform.transform_point3(*floater);
                self.world.push(position);
                self.points.push(Vec2::new(position.x, position.z));
            }
        }

        if self.dirty || self.sampler.is_none() {
            log::debug!(
                "[OceanFieldBuoyancy::issue] rebuilding sampler for {} floaters",
                self.points.len()
            );
            let mut sampler = surface.create_points_sampler(self.points.len())?;
            sampler.set_sample_lifetime(self.sample_lifetime);
            self.sampler = Some(sampler);
            self.dirty = false;
        }

        if let Some(sampler) = self.sampler.as_mut() {
            self.sample = Some(sampler.sample(&self.points)?);
        }
        Ok(())
    }
}
